use data_sanct::config::pacing::{Delays, PacingConfig};
use data_sanct::domain::model::DataKind;
use data_sanct::domain::ports::CleaningApi;
use data_sanct::{
    AppController, AssetExporter, Dashboard, HttpCleaningApi, LocalStorage, TaskState, UploadWidget,
};
use httpmock::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn fast_pacing() -> PacingConfig {
    PacingConfig {
        delays: Delays::immediate(),
        ..Default::default()
    }
}

async fn write_upload(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    tokio::fs::write(&path, contents).await.unwrap();
    path
}

#[tokio::test]
async fn test_tabular_upload_to_dashboard() {
    let temp_dir = TempDir::new().unwrap();
    let csv = write_upload(&temp_dir, "people.csv", b"name,age\nann,\nbob,40\n").await;

    let server = MockServer::start();
    let analyze_mock = server.mock(|when, then| {
        when.method(POST).path("/analyze").body_contains("people.csv");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "file_id": "abc",
                "original_filename": "people.csv",
                "type": "tabular",
                "analysis": {"rows": 100},
                "plan": {"reasoning": ["Detected 3 nulls"], "plan": []}
            }));
    });
    let clean_mock = server.mock(|when, then| {
        when.method(POST).path("/clean/abc");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "status": "success",
                "stats": {
                    "original_rows": 100,
                    "cleaned_rows": 90,
                    "removed_rows": 10,
                    "original_columns": 5,
                    "cleaned_columns": 5
                },
                "report": {
                    "removed_columns": [],
                    "imputed_columns": ["age (mean)"],
                    "outliers_removed": 7,
                    "duplicates_removed": 3
                },
                "download_url": "/download/cleaned_abc.csv"
            }));
    });

    let api = HttpCleaningApi::new(&server.base_url()).unwrap();
    let controller = AppController::new(api, fast_pacing());

    let task = UploadWidget::submit(&[csv], |file| controller.handle_upload(file))
        .await
        .unwrap();
    assert!(task.is_some());

    let session = controller.wait_settled().await;
    analyze_mock.assert();
    clean_mock.assert();

    assert_eq!(session.state, TaskState::Done);
    assert_eq!(
        session.trail,
        vec![
            TaskState::Uploading,
            TaskState::Analyzing,
            TaskState::Cleaning,
            TaskState::Done
        ]
    );

    let completed = controller.completed().unwrap();
    let dashboard = Dashboard::from_completed(&completed, |path| controller.api().asset_url(path));

    assert_eq!(dashboard.kind, DataKind::Tabular);
    assert_eq!(dashboard.card("Original Rows").unwrap().value, "100");
    assert_eq!(dashboard.card("Cleaned Rows").unwrap().value, "90");
    let removed = dashboard.card("Rows Removed").unwrap();
    assert_eq!(removed.value, "10");
    assert_eq!(removed.detail.as_deref(), Some("7 Outliers • 3 Duplicates"));
    let imputed = dashboard.card("Columns Imputed").unwrap();
    assert_eq!(imputed.value, "1");
    assert_eq!(imputed.detail.as_deref(), Some("1 Mean"));
    assert_eq!(dashboard.execution_log, vec!["Detected 3 nulls", "STATUS: OPTIMIZED"]);
}

#[tokio::test]
async fn test_image_upload_renders_comparison() {
    let temp_dir = TempDir::new().unwrap();
    let png = write_upload(&temp_dir, "noisy.png", &[0x89, b'P', b'N', b'G']).await;

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/analyze");
        then.status(200).json_body(serde_json::json!({
            "file_id": "img1",
            "type": "image",
            "plan": {"reasoning": ["Input image analysis reveals Gaussian noise patterns."]}
        }));
    });
    server.mock(|when, then| {
        when.method(POST).path("/clean/img1");
        then.status(200).json_body(serde_json::json!({
            "status": "success",
            "download_url": "/download/cleaned_img1.png"
        }));
    });

    let api = HttpCleaningApi::new(&server.base_url()).unwrap();
    let controller = AppController::new(api, fast_pacing());

    UploadWidget::submit(&[png], |file| controller.handle_upload(file))
        .await
        .unwrap();
    let session = controller.wait_settled().await;
    assert_eq!(session.state, TaskState::Done);

    let completed = controller.completed().unwrap();
    let dashboard = Dashboard::from_completed(&completed, |path| controller.api().asset_url(path));

    assert_eq!(dashboard.comparisons.len(), 1);
    assert!(dashboard.card("Original Rows").is_none());
    assert_eq!(
        dashboard.comparisons[0].original_url,
        server.url("/uploads/img1.png")
    );
    assert_eq!(
        dashboard.comparisons[0].processed_url,
        server.url("/download/cleaned_img1.png")
    );
}

#[tokio::test]
async fn test_server_error_ends_in_error_state() {
    let temp_dir = TempDir::new().unwrap();
    let csv = write_upload(&temp_dir, "broken.csv", b"a,b\n").await;

    let server = MockServer::start();
    let analyze_mock = server.mock(|when, then| {
        when.method(POST).path("/analyze");
        then.status(200).json_body(serde_json::json!({
            "file_id": "broken",
            "type": "tabular",
            "plan": {"reasoning": []}
        }));
    });
    let clean_mock = server.mock(|when, then| {
        when.method(POST).path("/clean/broken");
        then.status(500).json_body(serde_json::json!({"detail": "boom"}));
    });

    let api = HttpCleaningApi::new(&server.base_url()).unwrap();
    let controller = AppController::new(api, fast_pacing());

    UploadWidget::submit(&[csv], |file| controller.handle_upload(file))
        .await
        .unwrap();
    let session = controller.wait_settled().await;

    analyze_mock.assert();
    clean_mock.assert();
    assert_eq!(session.state, TaskState::Error);
    assert_eq!(
        session.trail,
        vec![
            TaskState::Uploading,
            TaskState::Analyzing,
            TaskState::Cleaning,
            TaskState::Error
        ]
    );
    assert!(controller.completed().is_none());

    controller.reset();
    let session = controller.session();
    assert_eq!(session.state, TaskState::Idle);
    assert!(session.analysis.is_none());
}

#[tokio::test]
async fn test_unreachable_service_is_request_failure() {
    let temp_dir = TempDir::new().unwrap();
    let csv = write_upload(&temp_dir, "people.csv", b"a\n1\n").await;

    // Nothing listens on the discard port.
    let api = HttpCleaningApi::new("http://127.0.0.1:9").unwrap();
    let controller = AppController::new(api, fast_pacing());

    UploadWidget::submit(&[csv], |file| controller.handle_upload(file))
        .await
        .unwrap();
    let session = controller.wait_settled().await;

    assert_eq!(session.state, TaskState::Error);
    assert!(session.error.unwrap().contains("Request failed"));
}

#[tokio::test]
async fn test_download_and_archive_to_output_dir() {
    let upload_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let csv = write_upload(&upload_dir, "people.csv", b"name,age\nann,31\n").await;

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/analyze");
        then.status(200).json_body(serde_json::json!({
            "file_id": "abc",
            "type": "tabular",
            "plan": {"reasoning": ["Detected 1 nulls"]}
        }));
    });
    server.mock(|when, then| {
        when.method(POST).path("/clean/abc");
        then.status(200).json_body(serde_json::json!({
            "stats": {"original_rows": 1, "cleaned_rows": 1},
            "report": {"removed_columns": [], "imputed_columns": []},
            "download_url": "/download/cleaned_abc.csv"
        }));
    });
    let download_mock = server.mock(|when, then| {
        when.method(GET).path("/download/cleaned_abc.csv");
        then.status(200).body("name,age\nann,31\n");
    });

    let api = HttpCleaningApi::new(&server.base_url()).unwrap();
    let controller = AppController::new(api, fast_pacing());
    UploadWidget::submit(&[csv], |file| controller.handle_upload(file))
        .await
        .unwrap();
    controller.wait_settled().await;

    let completed = controller.completed().unwrap();
    let dashboard = Dashboard::from_completed(&completed, |path| controller.api().asset_url(path));
    let exporter = AssetExporter::new(controller.api(), LocalStorage::new(output_dir.path()));

    let saved = exporter.download(&completed).await.unwrap();
    let archived = exporter.archive(&completed, &dashboard).await.unwrap();

    download_mock.assert_hits(2);
    assert_eq!(
        std::fs::read_to_string(output_dir.path().join(saved)).unwrap(),
        "name,age\nann,31\n"
    );
    assert!(output_dir.path().join(archived).exists());
}
