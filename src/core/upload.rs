//! File selection for a new task.
//!
//! Mirrors a drop zone: one file per selection, the accept list is a hint only.

use crate::domain::model::UploadedFile;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

pub const ACCEPTED_EXTENSIONS: [&str; 7] = ["csv", "xlsx", "xls", "zip", "jpg", "jpeg", "png"];

/// First file of a selection; the rest are ignored.
pub fn select(paths: &[PathBuf]) -> Option<&PathBuf> {
    if paths.len() > 1 {
        tracing::debug!("Ignoring {} additional file(s) in selection", paths.len() - 1);
    }
    paths.first()
}

pub fn is_accepted(path: &Path) -> bool {
    extension(path)
        .map(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

pub fn mime_for(path: &Path) -> &'static str {
    match extension(path).as_deref() {
        Some("csv") => "text/csv",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("xls") => "application/vnd.ms-excel",
        Some("zip") => "application/zip",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

pub async fn load(path: &Path) -> Result<UploadedFile> {
    if !is_accepted(path) {
        tracing::warn!(
            "{} is not a listed type ({}); sending it anyway",
            path.display(),
            ACCEPTED_EXTENSIONS.join(", ")
        );
    }

    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    Ok(UploadedFile {
        file_name,
        mime: mime_for(path).to_string(),
        bytes,
    })
}

pub struct UploadWidget;

impl UploadWidget {
    /// Loads the first selected file and hands it to `on_upload`.
    /// Returns `None` for an empty selection.
    pub async fn submit<F, T>(paths: &[PathBuf], on_upload: F) -> Result<Option<T>>
    where
        F: FnOnce(UploadedFile) -> T,
    {
        let Some(path) = select(paths) else {
            return Ok(None);
        };

        let file = load(path).await?;
        tracing::info!("Selected {} ({} bytes)", file.file_name, file.bytes.len());
        Ok(Some(on_upload(file)))
    }
}
