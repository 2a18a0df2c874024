use crate::domain::model::Phase;
use crate::utils::error::{Result, SanctError};
use crate::utils::validation::{validate_non_decreasing, validate_non_empty_string, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const LINE_INTERVAL_MS: u64 = 800;

const ANALYZING_LINES: [&str; 6] = [
    "Initializing core agents...",
    "Mounting file system...",
    "Scanning data structure...",
    "Detecting anomalies...",
    "Profiling column distributions...",
    "Generating heuristic model...",
];

const CLEANING_LINES: [&str; 7] = [
    "Loading cleaning strategy...",
    "Optimizing data vectors...",
    "Imputing missing values (Strategy: Adaptive)...",
    "Removing statistical outliers (Alpha: 0.05)...",
    "Denoising signal...",
    "Verifying integrity...",
    "Finalizing dataset...",
];

/// Cosmetic pacing of a task: controller delays plus the per-phase status scripts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PacingConfig {
    #[serde(default)]
    pub delays: Delays,
    #[serde(default)]
    pub scripts: Scripts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Delays {
    /// Pause after a successful analysis before entering the cleaning phase.
    pub analyze_display_ms: u64,
    /// Pause inside the cleaning phase before the clean request goes out.
    pub clean_request_ms: u64,
    /// Pause after the clean response before showing the dashboard.
    pub finish_display_ms: u64,
    pub request_timeout_secs: Option<u64>,
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            analyze_display_ms: 2500,
            clean_request_ms: 3000,
            finish_display_ms: 1500,
            request_timeout_secs: None,
        }
    }
}

impl Delays {
    pub fn immediate() -> Self {
        Self {
            analyze_display_ms: 0,
            clean_request_ms: 0,
            finish_display_ms: 0,
            request_timeout_secs: None,
        }
    }

    pub fn analyze_display(&self) -> Duration {
        Duration::from_millis(self.analyze_display_ms)
    }

    pub fn clean_request(&self) -> Duration {
        Duration::from_millis(self.clean_request_ms)
    }

    pub fn finish_display(&self) -> Duration {
        Duration::from_millis(self.finish_display_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptLine {
    pub text: String,
    pub offset_ms: u64,
}

impl ScriptLine {
    pub fn offset(&self) -> Duration {
        Duration::from_millis(self.offset_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scripts {
    pub analyzing: Vec<ScriptLine>,
    pub cleaning: Vec<ScriptLine>,
}

impl Default for Scripts {
    fn default() -> Self {
        Self {
            analyzing: evenly_spaced(&ANALYZING_LINES, LINE_INTERVAL_MS),
            cleaning: evenly_spaced(&CLEANING_LINES, LINE_INTERVAL_MS),
        }
    }
}

impl Scripts {
    pub fn for_phase(&self, phase: Phase) -> &[ScriptLine] {
        match phase {
            Phase::Analyzing => &self.analyzing,
            Phase::Cleaning => &self.cleaning,
        }
    }
}

pub fn evenly_spaced(lines: &[&str], interval_ms: u64) -> Vec<ScriptLine> {
    lines
        .iter()
        .zip(0u64..)
        .map(|(text, i)| ScriptLine {
            text: text.to_string(),
            offset_ms: i * interval_ms,
        })
        .collect()
}

impl PacingConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SanctError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| SanctError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| SanctError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl Validate for PacingConfig {
    fn validate(&self) -> Result<()> {
        for phase in [Phase::Analyzing, Phase::Cleaning] {
            let lines = self.scripts.for_phase(phase);
            let field = format!("scripts.{}", phase);

            for line in lines {
                validate_non_empty_string(&format!("{}.text", field), &line.text)?;
            }

            let offsets: Vec<u64> = lines.iter().map(|line| line.offset_ms).collect();
            validate_non_decreasing(&format!("{}.offset_ms", field), &offsets)?;
        }

        if self.delays.request_timeout_secs == Some(0) {
            return Err(SanctError::InvalidConfigValueError {
                field: "delays.request_timeout_secs".to_string(),
                value: "0".to_string(),
                reason: "Timeout must be at least 1 second; omit it to wait indefinitely".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_match_status_terminal() {
        let config = PacingConfig::default();

        assert_eq!(config.scripts.analyzing.len(), 6);
        assert_eq!(config.scripts.cleaning.len(), 7);
        assert_eq!(config.scripts.cleaning[3].offset_ms, 2400);
        assert_eq!(config.delays.analyze_display(), Duration::from_millis(2500));
        assert_eq!(config.delays.clean_request(), Duration::from_millis(3000));
        assert_eq!(config.delays.finish_display(), Duration::from_millis(1500));
        assert!(config.delays.request_timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml_keeps_defaults() {
        let toml_content = r#"
[delays]
analyze_display_ms = 100

[[scripts.analyzing]]
text = "Warming up..."
offset_ms = 0

[[scripts.analyzing]]
text = "Reading rows..."
offset_ms = 250
"#;

        let config = PacingConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.delays.analyze_display_ms, 100);
        assert_eq!(config.delays.clean_request_ms, 3000);
        assert_eq!(config.scripts.analyzing.len(), 2);
        assert_eq!(config.scripts.analyzing[1].offset(), Duration::from_millis(250));
        assert_eq!(config.scripts.cleaning.len(), 7);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("SANCT_TEST_FINISH_MS", "42");

        let toml_content = r#"
[delays]
finish_display_ms = ${SANCT_TEST_FINISH_MS}
"#;

        let config = PacingConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.delays.finish_display_ms, 42);

        std::env::remove_var("SANCT_TEST_FINISH_MS");
    }

    #[test]
    fn test_validation_rejects_backwards_offsets() {
        let toml_content = r#"
[[scripts.cleaning]]
text = "second"
offset_ms = 800

[[scripts.cleaning]]
text = "first"
offset_ms = 0
"#;

        let config = PacingConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = PacingConfig::from_toml_str("[delays\n").unwrap_err();
        assert!(matches!(err, SanctError::ConfigError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[delays]\nrequest_timeout_secs = 30\n")
            .unwrap();

        let config = PacingConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.delays.request_timeout(), Some(Duration::from_secs(30)));
    }
}
