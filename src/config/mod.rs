/// Configuration system for aihub.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: hardcoded in [`schema::AiHubConfig::default()`]
/// 2. **User global config**: `~/.aihub/config.toml`
/// 3. **Project local config**: `.aihub.toml` in the current working directory
/// 4. **Environment variables**: `AIHUB_*` overrides (highest precedence)
///
/// File layers are merged at the key level: a project file that only sets
/// `classifier.base_url` keeps every other value from the global file.
///
/// # Usage
///
/// ```rust,ignore
/// use aihub::config;
///
/// let cfg = config::load();
/// let client = aihub::classifier::ClassifierClient::new(&cfg.classifier);
/// ```
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::ingest::MAX_PREVIEW_ROWS;

pub use schema::AiHubConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved aihub configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars. This is the primary entry point for all modules that need
/// configuration.
pub fn load() -> AiHubConfig {
    let layers = [
        read_toml_value(global_config_path()),
        read_toml_value(project_config_path()),
    ];

    let mut config = resolve_layers(layers.into_iter().flatten());
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

/// Merge TOML layers (lowest precedence first) over the built-in defaults.
///
/// A layer that fails to deserialize after merging is skipped, so a typo in
/// one file never takes down the whole tool.
fn resolve_layers(layers: impl Iterator<Item = toml::Value>) -> AiHubConfig {
    let mut merged = match toml::Value::try_from(AiHubConfig::default()) {
        Ok(value) => value,
        Err(_) => return AiHubConfig::default(),
    };

    for layer in layers {
        let mut candidate = merged.clone();
        merge_toml(&mut candidate, layer);
        if candidate.clone().try_into::<AiHubConfig>().is_ok() {
            merged = candidate;
        }
    }

    merged.try_into().unwrap_or_default()
}

/// Read a TOML file as a raw value tree (if it exists and parses).
fn read_toml_value(path: Option<PathBuf>) -> Option<toml::Value> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    toml::from_str(&content).ok()
}

/// Recursively merge `overlay` into `base`. Tables merge key by key; any
/// other value in the overlay replaces the base value.
fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.aihub/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".aihub").join("config.toml"))
}

/// Path to the project local config: `.aihub.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".aihub.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `AIHUB_CLASSIFIER_URL`: classifier base URL
/// - `COMPLAINT_CLASSIFIER_URL`: same, used when the above is unset
/// - `AIHUB_TIMEOUT_MS`: per-request timeout
/// - `AIHUB_POLL_INTERVAL_SECS`: status poll interval
/// - `AIHUB_PREVIEW_ROWS`: preview size, kept within `1..=10`
/// - `AIHUB_DOWNLOAD_DIR`: artifact download directory
/// - `AIHUB_HISTORY`: run log on/off (`1`/`true`/`yes`/`on`)
///
/// `lookup` abstracts `std::env::var` so the precedence rules can be tested
/// without touching process-wide state.
pub fn apply_env_overrides(config: &mut AiHubConfig, lookup: impl Fn(&str) -> Option<String>) {
    let url = lookup("AIHUB_CLASSIFIER_URL")
        .filter(|v| !v.is_empty())
        .or_else(|| lookup("COMPLAINT_CLASSIFIER_URL").filter(|v| !v.is_empty()));
    if let Some(url) = url {
        config.classifier.base_url = url;
    }

    if let Some(val) = lookup("AIHUB_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.classifier.timeout_ms = ms;
    }
    if let Some(val) = lookup("AIHUB_POLL_INTERVAL_SECS")
        && let Ok(secs) = val.parse::<u64>()
        && secs > 0
    {
        config.classifier.poll_interval_secs = secs;
    }
    if let Some(val) = lookup("AIHUB_PREVIEW_ROWS")
        && let Ok(rows) = val.parse::<usize>()
    {
        config.upload.preview_rows = rows.clamp(1, MAX_PREVIEW_ROWS);
    }
    if let Some(val) = lookup("AIHUB_DOWNLOAD_DIR") {
        config.output.download_dir = val;
    }
    if let Some(val) = lookup("AIHUB_HISTORY") {
        config.history.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.aihub/config.toml`.
///
/// Creates the `~/.aihub/` directory if it doesn't exist. Returns an error
/// if the file already exists (use `force = true` to overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.aihub/ directory")?;
    }

    fs::write(&path, AiHubConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key to a value in the global config file.
///
/// Supports dotted keys like `classifier.base_url`. When no global file
/// exists yet, the defaults are written first.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let content = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&AiHubConfig::default())
            .context("failed to serialize default config")?
    };

    let mut value_table: toml::Value =
        toml::from_str(&content).context("failed to parse config as TOML value")?;
    set_toml_value(&mut value_table, key, value)?;

    // Reject edits that would no longer deserialize.
    value_table
        .clone()
        .try_into::<AiHubConfig>()
        .with_context(|| format!("invalid value for '{key}': {value}"))?;

    let output =
        toml::to_string_pretty(&value_table).context("failed to serialize updated config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').filter(|p| !p.is_empty()).collect();
    let Some((leaf, sections)) = parts.split_last() else {
        anyhow::bail!("empty config key");
    };

    let mut current = root;
    for &part in sections {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    let new_value = match table.get(*leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        Some(toml::Value::Array(_)) => toml::Value::Array(
            raw_value
                .split(',')
                .map(|s| toml::Value::String(s.trim().to_string()))
                .collect(),
        ),
        Some(_) => toml::Value::String(raw_value.to_string()),
        None => anyhow::bail!("unknown config key: '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn is_truthy_accepts_variants() {
        assert!(is_truthy("1"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy("yes"));
        assert!(is_truthy("On"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("off"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn project_layer_overrides_only_its_keys() {
        let global: toml::Value = toml::from_str(
            r#"
[classifier]
base_url = "http://global:8001"
poll_interval_secs = 30
"#,
        )
        .unwrap();
        let project: toml::Value = toml::from_str(
            r#"
[classifier]
base_url = "http://project:8001"
"#,
        )
        .unwrap();

        let config = resolve_layers([global, project].into_iter());
        assert_eq!(config.classifier.base_url, "http://project:8001");
        assert_eq!(config.classifier.poll_interval_secs, 30);
        assert_eq!(config.upload.preview_rows, 10);
    }

    #[test]
    fn invalid_layer_is_skipped() {
        let bad: toml::Value = toml::from_str(
            r#"
[upload]
preview_rows = "lots"
"#,
        )
        .unwrap();
        let config = resolve_layers([bad].into_iter());
        assert_eq!(config.upload.preview_rows, 10);
    }

    #[test]
    fn env_url_prefers_aihub_variable() {
        let mut config = AiHubConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("AIHUB_CLASSIFIER_URL", "http://a:1"),
                ("COMPLAINT_CLASSIFIER_URL", "http://b:2"),
            ]),
        );
        assert_eq!(config.classifier.base_url, "http://a:1");
    }

    #[test]
    fn env_url_falls_back_to_legacy_variable() {
        let mut config = AiHubConfig::default();
        apply_env_overrides(&mut config, env(&[("COMPLAINT_CLASSIFIER_URL", "http://b:2")]));
        assert_eq!(config.classifier.base_url, "http://b:2");
    }

    #[test]
    fn env_ignores_unparseable_numbers() {
        let mut config = AiHubConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("AIHUB_TIMEOUT_MS", "soon"),
                ("AIHUB_POLL_INTERVAL_SECS", "0"),
                ("AIHUB_PREVIEW_ROWS", "25"),
                ("AIHUB_HISTORY", "off"),
            ]),
        );
        assert_eq!(config.classifier.timeout_ms, 300_000);
        assert_eq!(config.classifier.poll_interval_secs, 5);
        assert_eq!(config.upload.preview_rows, 10);
        assert!(!config.history.enabled);
    }

    #[test]
    fn set_toml_value_updates_string() {
        let mut root: toml::Value = toml::from_str(
            r#"
[classifier]
base_url = "http://localhost:8001"
"#,
        )
        .unwrap();
        set_toml_value(&mut root, "classifier.base_url", "http://x:9").unwrap();
        assert_eq!(
            root["classifier"]["base_url"].as_str(),
            Some("http://x:9")
        );
    }

    #[test]
    fn set_toml_value_updates_integer_and_bool() {
        let mut root: toml::Value = toml::from_str(
            r#"
[classifier]
poll_interval_secs = 5

[history]
enabled = true
"#,
        )
        .unwrap();
        set_toml_value(&mut root, "classifier.poll_interval_secs", "10").unwrap();
        set_toml_value(&mut root, "history.enabled", "no").unwrap();
        assert_eq!(root["classifier"]["poll_interval_secs"].as_integer(), Some(10));
        assert_eq!(root["history"]["enabled"].as_bool(), Some(false));
    }

    #[test]
    fn set_toml_value_splits_arrays() {
        let mut root: toml::Value = toml::from_str(
            r#"
[upload]
allowed_extensions = ["csv"]
"#,
        )
        .unwrap();
        set_toml_value(&mut root, "upload.allowed_extensions", "csv, xlsx").unwrap();
        let items = root["upload"]["allowed_extensions"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].as_str(), Some("xlsx"));
    }

    #[test]
    fn set_toml_value_rejects_unknown_keys() {
        let mut root: toml::Value = toml::from_str("[classifier]\nbase_url = \"x\"\n").unwrap();
        assert!(set_toml_value(&mut root, "nonexistent.key", "value").is_err());
        assert!(set_toml_value(&mut root, "classifier.nope", "value").is_err());
        assert!(set_toml_value(&mut root, "", "value").is_err());
    }

    #[test]
    fn set_toml_value_rejects_bad_integer() {
        let mut root: toml::Value = toml::from_str("[upload]\npreview_rows = 10\n").unwrap();
        assert!(set_toml_value(&mut root, "upload.preview_rows", "ten").is_err());
    }
}
