use crate::domain::model::{AnalysisResult, CleaningResult, UploadedFile};
use crate::domain::ports::CleaningApi;
use crate::utils::error::{Result, SanctError};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// reqwest-backed client for the cleaning service.
#[derive(Debug, Clone)]
pub struct HttpCleaningApi {
    client: Client,
    base_url: Url,
}

impl HttpCleaningApi {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, None)
    }

    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| SanctError::InvalidConfigValueError {
            field: "api_url".to_string(),
            value: base_url.to_string(),
            reason: format!("Invalid URL format: {}", e),
        })?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SanctError::ConfigError {
                message: format!("API URL cannot be a base: {}", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Server-relative asset paths live under the base URL, path included,
    /// like the API endpoints. Absolute URLs pass through.
    fn resolve(&self, path: &str) -> Result<Url> {
        if let Ok(absolute) = Url::parse(path) {
            return Ok(absolute);
        }

        let (path, query) = match path.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (path, None),
        };
        let segments: Vec<&str> = path.split('/').filter(|segment| !segment.is_empty()).collect();

        let mut url = self.endpoint(&segments)?;
        url.set_query(query);
        Ok(url)
    }
}

#[async_trait]
impl CleaningApi for HttpCleaningApi {
    async fn analyze(&self, file: &UploadedFile) -> Result<AnalysisResult> {
        let url = self.endpoint(&["analyze"])?;
        tracing::debug!(
            "Uploading {} ({} bytes, {}) to {}",
            file.file_name,
            file.bytes.len(),
            file.mime,
            url
        );

        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime)?;
        let form = Form::new().part("file", part);

        let response = self.client.post(url).multipart(form).send().await?;
        tracing::debug!("Analyze response status: {}", response.status());

        let analysis = response.error_for_status()?.json::<AnalysisResult>().await?;
        Ok(analysis)
    }

    async fn clean(&self, file_id: &str) -> Result<CleaningResult> {
        let url = self.endpoint(&["clean", file_id])?;
        tracing::debug!("Requesting clean at {}", url);

        let response = self.client.post(url).send().await?;
        tracing::debug!("Clean response status: {}", response.status());

        let result = response.error_for_status()?.json::<CleaningResult>().await?;
        Ok(result)
    }

    async fn fetch_asset(&self, path: &str) -> Result<Vec<u8>> {
        let url = self.resolve(path)?;
        tracing::debug!("Fetching asset {}", url);

        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    fn asset_url(&self, path: &str) -> String {
        match self.resolve(path) {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::DataKind;
    use httpmock::prelude::*;

    fn csv_upload() -> UploadedFile {
        UploadedFile {
            file_name: "people.csv".to_string(),
            mime: "text/csv".to_string(),
            bytes: b"name,age\nann,31\n".to_vec(),
        }
    }

    #[tokio::test]
    async fn test_analyze_posts_multipart_file() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/analyze")
                .header_exists("content-type")
                .body_contains("name=\"file\"")
                .body_contains("people.csv");
            then.status(200).json_body(serde_json::json!({
                "file_id": "abc",
                "type": "tabular",
                "plan": {"reasoning": ["Detected 3 nulls"]}
            }));
        });

        let api = HttpCleaningApi::new(&server.base_url()).unwrap();
        let analysis = api.analyze(&csv_upload()).await.unwrap();

        mock.assert();
        assert_eq!(analysis.file_id, "abc");
        assert_eq!(analysis.kind, DataKind::Tabular);
    }

    #[tokio::test]
    async fn test_clean_non_success_is_request_failure() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/clean/missing");
            then.status(404).json_body(serde_json::json!({"detail": "File not found"}));
        });

        let api = HttpCleaningApi::new(&server.base_url()).unwrap();
        let err = api.clean("missing").await.unwrap_err();

        mock.assert();
        assert!(matches!(err, SanctError::RequestFailed(_)));
    }

    #[tokio::test]
    async fn test_fetch_asset_returns_bytes() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/download/cleaned_abc.csv");
            then.status(200).body("name,age\nann,31\n");
        });

        let api = HttpCleaningApi::new(&server.base_url()).unwrap();
        let bytes = api.fetch_asset("/download/cleaned_abc.csv").await.unwrap();
        assert_eq!(bytes, b"name,age\nann,31\n");
    }

    #[test]
    fn test_asset_url_joins_base() {
        let api = HttpCleaningApi::new("http://localhost:8000").unwrap();
        assert_eq!(
            api.asset_url("/uploads/abc.png"),
            "http://localhost:8000/uploads/abc.png"
        );
        assert_eq!(
            api.asset_url("https://cdn.example.com/x.png"),
            "https://cdn.example.com/x.png"
        );
    }

    #[test]
    fn test_asset_url_keeps_base_path() {
        let api = HttpCleaningApi::new("http://host/api/").unwrap();
        assert_eq!(
            api.asset_url("/download/cleaned_abc.csv"),
            "http://host/api/download/cleaned_abc.csv"
        );
        assert_eq!(api.asset_url("uploads/abc.png"), "http://host/api/uploads/abc.png");
        assert_eq!(
            api.endpoint(&["analyze"]).unwrap().as_str(),
            "http://host/api/analyze"
        );
    }

    #[tokio::test]
    async fn test_base_path_applies_to_requests_and_assets() {
        let server = MockServer::start();
        let analyze = server.mock(|when, then| {
            when.method(POST).path("/api/analyze");
            then.status(200).json_body(serde_json::json!({
                "file_id": "abc",
                "type": "tabular"
            }));
        });
        let asset = server.mock(|when, then| {
            when.method(GET).path("/api/download/cleaned_abc.csv");
            then.status(200).body("a,b\n");
        });

        let api = HttpCleaningApi::new(&server.url("/api/")).unwrap();
        api.analyze(&csv_upload()).await.unwrap();
        let bytes = api.fetch_asset("/download/cleaned_abc.csv").await.unwrap();

        analyze.assert();
        asset.assert();
        assert_eq!(bytes, b"a,b\n");
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(HttpCleaningApi::new("not a url").is_err());
    }
}
