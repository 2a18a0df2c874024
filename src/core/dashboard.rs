//! Results dashboard.
//!
//! `Dashboard::build` turns a finished task into a view model; `Display`
//! renders it for the terminal. Absent numbers show as 0 and absent lists as
//! empty; that is a presentation default, not validation.

use crate::domain::model::{AnalysisResult, CleaningResult, CompletedTask, DataKind};
use serde::Serialize;
use std::fmt;

pub const TITLE: &str = "Mission Accomplished";
pub const SUBTITLE: &str = "Data has been purified and verified.";
pub const FINAL_STATUS: &str = "STATUS: OPTIMIZED";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatCard {
    pub label: &'static str,
    pub value: String,
    pub detail: Option<String>,
}

impl StatCard {
    fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
            detail: None,
        }
    }

    fn with_detail(mut self, detail: String) -> Self {
        self.detail = Some(detail);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSection {
    pub title: &'static str,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonPair {
    pub original_url: String,
    pub processed_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub kind: DataKind,
    pub cards: Vec<StatCard>,
    pub sections: Vec<ReportSection>,
    pub execution_log: Vec<String>,
    pub comparisons: Vec<ComparisonPair>,
    pub download_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImputationBreakdown {
    pub mean: usize,
    pub median: usize,
    pub mode: usize,
}

impl ImputationBreakdown {
    /// Counts strategy tags such as `"age (mean)"` by substring.
    pub fn from_labels(labels: &[String]) -> Self {
        let count = |tag: &str| labels.iter().filter(|label| label.contains(tag)).count();
        Self {
            mean: count("(mean)"),
            median: count("(median)"),
            mode: count("(mode)"),
        }
    }
}

impl fmt::Display for ImputationBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = [
            (self.mean, "Mean"),
            (self.median, "Median"),
            (self.mode, "Mode"),
        ]
        .into_iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, name)| format!("{} {}", count, name))
        .collect();

        if parts.is_empty() {
            f.write_str("None")
        } else {
            f.write_str(&parts.join(" • "))
        }
    }
}

/// `1234567` -> `"1,234,567"`.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Server path of the untouched upload.
///
/// Uses `original_url` when the backend sends one; otherwise rebuilds
/// `/uploads/{file_id}.{ext}` with the extension of the processed asset.
pub fn original_asset_path(file_id: &str, result: &CleaningResult) -> String {
    if let Some(url) = result.original_url.as_deref().filter(|url| !url.is_empty()) {
        return url.to_string();
    }

    let file_name = result.download_url.rsplit('/').next().unwrap_or_default();
    match file_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => format!("/uploads/{}.{}", file_id, ext),
        _ => format!("/uploads/{}", file_id),
    }
}

impl Dashboard {
    /// `resolve` maps a server-relative asset path to a fetchable URL.
    pub fn build<R>(
        kind: DataKind,
        analysis: &AnalysisResult,
        cleaning: &CleaningResult,
        resolve: R,
    ) -> Self
    where
        R: Fn(&str) -> String,
    {
        let task = CompletedTask::merge(analysis, cleaning);
        Self::assemble(kind, &task, resolve)
    }

    pub fn from_completed<R>(task: &CompletedTask, resolve: R) -> Self
    where
        R: Fn(&str) -> String,
    {
        Self::assemble(task.kind, task, resolve)
    }

    fn assemble<R>(kind: DataKind, task: &CompletedTask, resolve: R) -> Self
    where
        R: Fn(&str) -> String,
    {
        let result = &task.result;
        let mut dashboard = Dashboard {
            kind,
            cards: Vec::new(),
            sections: Vec::new(),
            execution_log: Vec::new(),
            comparisons: Vec::new(),
            download_url: (!result.download_url.is_empty()).then(|| resolve(&result.download_url)),
        };

        match kind {
            DataKind::Tabular => {
                dashboard.cards = tabular_cards(result);
                dashboard.sections = tabular_sections(result);
            }
            DataKind::Image => {
                dashboard.cards = vec![StatCard::new("Noise Filtered", "100%")];
                dashboard.comparisons = vec![ComparisonPair {
                    original_url: resolve(&original_asset_path(&task.file_id, result)),
                    processed_url: resolve(&result.download_url),
                }];
            }
            DataKind::Unknown => {}
        }

        let reasoning = task.reasoning();
        if !reasoning.is_empty() {
            dashboard.execution_log = reasoning
                .iter()
                .cloned()
                .chain(std::iter::once(FINAL_STATUS.to_string()))
                .collect();
        }

        dashboard
    }

    pub fn card(&self, label: &str) -> Option<&StatCard> {
        self.cards.iter().find(|card| card.label == label)
    }
}

fn tabular_cards(result: &CleaningResult) -> Vec<StatCard> {
    let stats = &result.stats;
    let report = &result.report;

    let columns_deleted = if report.removed_columns.is_empty() {
        stats.removed_columns
    } else {
        report.removed_columns.len() as u64
    };

    vec![
        StatCard::new("Original Rows", group_thousands(stats.original_rows)),
        StatCard::new("Original Columns", stats.original_columns.to_string()),
        StatCard::new("Cleaned Rows", group_thousands(stats.cleaned_rows)),
        StatCard::new("Cleaned Columns", stats.cleaned_columns.to_string()),
        StatCard::new("Columns Deleted", columns_deleted.to_string()),
        StatCard::new("Rows Removed", group_thousands(stats.removed_rows)).with_detail(format!(
            "{} Outliers • {} Duplicates",
            report.outliers_removed, report.duplicates_removed
        )),
        StatCard::new("Columns Imputed", report.imputed_columns.len().to_string())
            .with_detail(ImputationBreakdown::from_labels(&report.imputed_columns).to_string()),
    ]
}

fn tabular_sections(result: &CleaningResult) -> Vec<ReportSection> {
    let report = &result.report;
    let mut sections = Vec::new();

    if !report.removed_columns.is_empty() {
        sections.push(ReportSection {
            title: "REMOVED COLUMNS (High Nulls)",
            items: report.removed_columns.clone(),
        });
    }
    if !report.imputed_columns.is_empty() {
        sections.push(ReportSection {
            title: "IMPUTED COLUMNS",
            items: report.imputed_columns.clone(),
        });
    }

    sections
}

impl fmt::Display for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", TITLE)?;
        writeln!(f, "{}", SUBTITLE)?;
        writeln!(f)?;

        for card in &self.cards {
            write!(f, "  {:<18}{:>10}", card.label, card.value)?;
            if let Some(detail) = &card.detail {
                write!(f, "   ({})", detail)?;
            }
            writeln!(f)?;
        }

        writeln!(f)?;
        writeln!(f, "Agent Report")?;
        for section in &self.sections {
            writeln!(f, "  {}: {}", section.title, section.items.join(", "))?;
        }

        if !self.execution_log.is_empty() {
            writeln!(f, "  EXECUTION LOG:")?;
            for entry in &self.execution_log {
                writeln!(f, "    > {}", entry)?;
            }
        }

        for pair in &self.comparisons {
            writeln!(f, "  {:<18}{}", "RAW INPUT", pair.original_url)?;
            writeln!(f, "  {:<18}{}", "PROCESSED OUTPUT", pair.processed_url)?;
        }

        if let Some(url) = &self.download_url {
            writeln!(f)?;
            writeln!(f, "Download Asset: {}", url)?;
        }

        Ok(())
    }
}
