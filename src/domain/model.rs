use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Reads an explicit `null` the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A file picked by the user, held only while it is being uploaded.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    Tabular,
    Image,
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataKind::Tabular => write!(f, "tabular"),
            DataKind::Image => write!(f, "image"),
            DataKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Which status script is playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Analyzing,
    Cleaning,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Analyzing => write!(f, "analyzing"),
            Phase::Cleaning => write!(f, "cleaning"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default, deserialize_with = "null_as_default")]
    pub reasoning: Vec<String>,
    /// Backend cleaning steps; opaque to the client.
    #[serde(default, deserialize_with = "null_as_default")]
    pub plan: Vec<serde_json::Value>,
}

/// Response of `POST /analyze`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub file_id: String,
    #[serde(default)]
    pub original_filename: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: DataKind,
    #[serde(default)]
    pub analysis: serde_json::Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub plan: Plan,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningStats {
    #[serde(deserialize_with = "null_as_default")]
    pub original_rows: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub original_columns: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub cleaned_rows: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub cleaned_columns: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub removed_rows: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub removed_columns: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningReport {
    #[serde(deserialize_with = "null_as_default")]
    pub removed_columns: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub imputed_columns: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub outliers_removed: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub duplicates_removed: u64,
}

/// Response of `POST /clean/{file_id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningResult {
    pub status: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub stats: CleaningStats,
    #[serde(deserialize_with = "null_as_default")]
    pub report: CleaningReport,
    #[serde(deserialize_with = "null_as_default")]
    pub download_url: String,
    pub original_url: Option<String>,
    pub plan: Option<Plan>,
}

/// Cleaning result with the analysis plan folded in, as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletedTask {
    pub file_id: String,
    pub kind: DataKind,
    #[serde(flatten)]
    pub result: CleaningResult,
}

impl CompletedTask {
    pub fn merge(analysis: &AnalysisResult, cleaning: &CleaningResult) -> Self {
        let mut result = cleaning.clone();
        result.plan = Some(analysis.plan.clone());
        Self {
            file_id: analysis.file_id.clone(),
            kind: analysis.kind,
            result,
        }
    }

    pub fn reasoning(&self) -> &[String] {
        self.result
            .plan
            .as_ref()
            .map(|plan| plan.reasoning.as_slice())
            .unwrap_or(&[])
    }
}
