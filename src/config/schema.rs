/// Configuration schema and defaults for aihub.
///
/// Defines the TOML-serializable configuration structure with all sections:
/// `[classifier]`, `[upload]`, `[output]`, `[history]`, and `[web]`.
///
/// Every field has a sensible built-in default. Users only need to set the
/// values they want to override.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level aihub configuration.
///
/// Maps directly to the `~/.aihub/config.toml` and `.aihub.toml` file
/// schemas. All sections and fields are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AiHubConfig {
    pub classifier: ClassifierConfig,
    pub upload: UploadConfig,
    pub output: OutputConfig,
    pub history: HistoryConfig,
    pub web: WebConfig,
}

// ---------------------------------------------------------------------------
// [classifier]
// ---------------------------------------------------------------------------

/// Connection settings for the complaint classification service.
///
/// Passed explicitly to [`crate::classifier::ClassifierClient`] at
/// construction; nothing in the client reads global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Base URL of the classification service.
    pub base_url: String,
    /// Per-request timeout (milliseconds). Analysis of large files is slow,
    /// so this is generous.
    pub timeout_ms: u64,
    /// Interval between model status polls (seconds).
    pub poll_interval_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            timeout_ms: 300_000,
            poll_interval_secs: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// [upload]
// ---------------------------------------------------------------------------

/// Spreadsheet ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Number of rows kept for the preview (1 to 10).
    pub preview_rows: usize,
    /// Accepted file extensions (lowercase, without the dot).
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            preview_rows: 10,
            allowed_extensions: vec!["xlsx".to_string(), "xls".to_string(), "csv".to_string()],
        }
    }
}

// ---------------------------------------------------------------------------
// [output]
// ---------------------------------------------------------------------------

/// Where downloaded result artifacts are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for downloaded artifacts. `~` is expanded; empty means the
    /// current directory.
    pub download_dir: String,
}

// ---------------------------------------------------------------------------
// [history]
// ---------------------------------------------------------------------------

/// Analysis run log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Whether analysis runs are appended to the JSONL log.
    pub enabled: bool,
    /// Path to the log file. `~` is expanded to the home directory.
    pub path: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.aihub/analysis-log.jsonl".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [web]
// ---------------------------------------------------------------------------

/// Local dashboard settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Listen address for `aihub web`.
    pub addr: String,
    /// Open the dashboard in the default browser on start.
    pub open_browser: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:9747".to_string(),
            open_browser: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

impl AiHubConfig {
    /// Annotated default config written by `aihub config init`.
    pub fn default_toml() -> String {
        r#"# aihub Configuration
# Complaint Classifier workbench
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (AIHUB_*)
#   2. Project config (.aihub.toml in current directory)
#   3. User global config (~/.aihub/config.toml)
#   4. Built-in defaults

[classifier]
base_url = "http://localhost:8001"    # or AIHUB_CLASSIFIER_URL / COMPLAINT_CLASSIFIER_URL
timeout_ms = 300000
poll_interval_secs = 5

[upload]
preview_rows = 10
allowed_extensions = ["xlsx", "xls", "csv"]

[output]
download_dir = ""                     # empty = current directory

[history]
enabled = true
path = "~/.aihub/analysis-log.jsonl"

[web]
addr = "127.0.0.1:9747"
open_browser = true
"#
        .to_string()
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> Option<std::path::PathBuf> {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir().map(|home| home.join(rest))
    } else if path == "~" {
        dirs::home_dir()
    } else {
        Some(std::path::PathBuf::from(path))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_produces_defaults() {
        let config: AiHubConfig = toml::from_str("").unwrap();
        assert_eq!(config.classifier.base_url, "http://localhost:8001");
        assert_eq!(config.upload.preview_rows, 10);
        assert!(config.history.enabled);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: AiHubConfig = toml::from_str(
            r#"
[classifier]
base_url = "http://classifier.internal:9000"
"#,
        )
        .unwrap();
        assert_eq!(config.classifier.base_url, "http://classifier.internal:9000");
        assert_eq!(config.classifier.poll_interval_secs, 5);
        assert_eq!(config.upload.allowed_extensions.len(), 3);
    }

    #[test]
    fn default_toml_parses_back() {
        let config: AiHubConfig = toml::from_str(&AiHubConfig::default_toml()).unwrap();
        let defaults = AiHubConfig::default();
        assert_eq!(config.classifier.base_url, defaults.classifier.base_url);
        assert_eq!(config.classifier.timeout_ms, defaults.classifier.timeout_ms);
        assert_eq!(config.upload.allowed_extensions, defaults.upload.allowed_extensions);
        assert_eq!(config.web.addr, defaults.web.addr);
    }

    #[test]
    fn expand_home_leaves_plain_paths() {
        assert_eq!(
            expand_home("out/results"),
            Some(std::path::PathBuf::from("out/results"))
        );
    }

    #[test]
    fn expand_home_resolves_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/x.jsonl"), Some(home.join("x.jsonl")));
        }
    }
}
