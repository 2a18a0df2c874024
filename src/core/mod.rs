pub mod animator;
pub mod controller;
pub mod dashboard;
pub mod state;
pub mod upload;

pub use crate::domain::model::{AnalysisResult, CleaningResult, CompletedTask, DataKind, Phase, UploadedFile};
pub use crate::domain::ports::{CleaningApi, Storage};
pub use crate::utils::error::Result;
