use crate::domain::ports::Storage;
use crate::utils::error::{Result, SanctError};
use std::path::{Component, Path, PathBuf};

/// Writes under `base_path` only; paths that would leave it are refused.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn full_path(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let contained = relative.components().all(|component| {
            matches!(component, Component::Normal(_) | Component::CurDir)
        });

        if path.is_empty() || !contained {
            return Err(SanctError::ValidationError {
                message: format!("Refusing to write outside the output directory: {}", path),
            });
        }
        Ok(self.base_path.join(relative))
    }
}

impl Storage for LocalStorage {
    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(path)?;

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(full_path, data).await?;
        Ok(())
    }
}
