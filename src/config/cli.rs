use crate::adapters::DEFAULT_API_URL;
use crate::config::pacing::PacingConfig;
use crate::utils::error::{Result, SanctError};
use crate::utils::validation::{validate_path, validate_url, Validate};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "data-sanct")]
#[command(about = "Send a dataset or image to the cleaning agent and review what it did")]
pub struct CliConfig {
    /// File to clean (CSV, Excel, ZIP or image). Only the first file is used.
    pub files: Vec<PathBuf>,

    #[arg(long, env = "DATA_SANCT_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// TOML file overriding delays and status scripts
    #[arg(long)]
    pub pacing: Option<PathBuf>,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    /// Save the cleaned asset into the output directory
    #[arg(long)]
    pub download: bool,

    /// Bundle asset, report and stats into a zip in the output directory
    #[arg(long)]
    pub archive: bool,

    /// Prompt for another file after each task
    #[arg(short, long)]
    pub interactive: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

impl CliConfig {
    pub fn load_pacing(&self) -> Result<PacingConfig> {
        let pacing = match &self.pacing {
            Some(path) => PacingConfig::from_file(path)?,
            None => PacingConfig::default(),
        };
        pacing.validate()?;
        Ok(pacing)
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_url("api_url", &self.api_url)?;
        validate_path("output_path", &self.output_path)?;

        if self.files.is_empty() && !self.interactive {
            return Err(SanctError::ConfigError {
                message: "No file given; pass a file or use --interactive".to_string(),
            });
        }

        Ok(())
    }
}
