use crate::domain::model::{AnalysisResult, CleaningResult, UploadedFile};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Where exported assets and archives are written.
pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// The remote analysis/cleaning service.
#[async_trait]
pub trait CleaningApi: Send + Sync + 'static {
    async fn analyze(&self, file: &UploadedFile) -> Result<AnalysisResult>;
    async fn clean(&self, file_id: &str) -> Result<CleaningResult>;
    async fn fetch_asset(&self, path: &str) -> Result<Vec<u8>>;
    /// Absolute URL for a server-relative asset path.
    fn asset_url(&self, path: &str) -> String;
}
