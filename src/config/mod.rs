#[cfg(feature = "cli")]
pub mod cli;
pub mod pacing;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use pacing::{Delays, PacingConfig, ScriptLine, Scripts};
