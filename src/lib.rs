pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{HttpCleaningApi, LocalStorage};
pub use app::AssetExporter;
pub use config::PacingConfig;
pub use crate::core::{
    controller::AppController,
    dashboard::Dashboard,
    state::{Session, TaskState},
    upload::UploadWidget,
};
pub use utils::error::{Result, SanctError};
