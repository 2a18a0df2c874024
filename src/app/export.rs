use crate::core::dashboard::Dashboard;
use crate::domain::model::CompletedTask;
use crate::domain::ports::{CleaningApi, Storage};
use crate::utils::error::{Result, SanctError};
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

/// Saves what a finished task produced: the cleaned asset, and optionally a
/// zip bundling it with the rendered report.
pub struct AssetExporter<'a, A: CleaningApi, S: Storage> {
    api: &'a A,
    storage: S,
}

/// Reduces a server-supplied name to one plain file name component.
pub fn safe_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = cleaned.trim_matches('.');
    if trimmed.is_empty() {
        "asset".to_string()
    } else {
        trimmed.to_string()
    }
}

/// File name of the processed asset, taken from its download URL.
pub fn asset_file_name(task: &CompletedTask) -> String {
    let path = task.result.download_url.split(['?', '#']).next().unwrap_or_default();
    let name = path
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("cleaned_{}", task.file_id));
    safe_file_name(&name)
}

pub fn archive_file_name(task: &CompletedTask) -> String {
    safe_file_name(&format!("sanct_{}.zip", task.file_id))
}

pub fn stats_csv(dashboard: &Dashboard) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["label", "value", "detail"])?;
    for card in &dashboard.cards {
        writer.write_record([card.label, card.value.as_str(), card.detail.as_deref().unwrap_or("")])?;
    }

    let bytes = writer.into_inner().map_err(|e| SanctError::IoError(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| SanctError::ValidationError {
        message: format!("stats.csv is not UTF-8: {}", e),
    })
}

impl<'a, A: CleaningApi, S: Storage> AssetExporter<'a, A, S> {
    pub fn new(api: &'a A, storage: S) -> Self {
        Self { api, storage }
    }

    async fn fetch(&self, task: &CompletedTask) -> Result<Vec<u8>> {
        if task.result.download_url.is_empty() {
            return Err(SanctError::ValidationError {
                message: format!("Task {} has no downloadable asset", task.file_id),
            });
        }
        self.api.fetch_asset(&task.result.download_url).await
    }

    /// Returns the name the asset was stored under.
    pub async fn download(&self, task: &CompletedTask) -> Result<String> {
        let data = self.fetch(task).await?;
        let name = asset_file_name(task);

        tracing::debug!("Writing {} ({} bytes) to storage", name, data.len());
        self.storage.write_file(&name, &data).await?;
        Ok(name)
    }

    pub async fn archive(&self, task: &CompletedTask, dashboard: &Dashboard) -> Result<String> {
        let asset = if task.result.download_url.is_empty() {
            tracing::warn!("No asset for {}; archiving report only", task.file_id);
            None
        } else {
            Some((asset_file_name(task), self.fetch(task).await?))
        };

        let generated_at = chrono::Utc::now().to_rfc3339();
        let report = format!("Generated at {}\n\n{}", generated_at, dashboard);
        let result_json = serde_json::to_string_pretty(&serde_json::json!({
            "generated_at": generated_at,
            "task": task,
        }))?;
        let stats = stats_csv(dashboard)?;

        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

            if let Some((name, data)) = &asset {
                zip.start_file::<_, ()>(name.as_str(), FileOptions::default())?;
                zip.write_all(data)?;
            }

            zip.start_file::<_, ()>("report.txt", FileOptions::default())?;
            zip.write_all(report.as_bytes())?;

            zip.start_file::<_, ()>("result.json", FileOptions::default())?;
            zip.write_all(result_json.as_bytes())?;

            zip.start_file::<_, ()>("stats.csv", FileOptions::default())?;
            zip.write_all(stats.as_bytes())?;

            let cursor = zip.finish()?;
            cursor.into_inner()
        };

        let name = archive_file_name(task);
        tracing::debug!("Writing archive {} ({} bytes)", name, zip_data.len());
        self.storage.write_file(&name, &zip_data).await?;
        Ok(name)
    }
}
