use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "pacelens.json";

/// Pipeline configuration: input locations, artifact directories, and the
/// designated training filenames. Loaded from `pacelens.json` when present,
/// with defaults filled in and empty values sanitized back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Changelog markdown containing the record table.
    pub changelog: String,
    /// Local clone of the speedrun project's full history.
    pub history_repo: String,
    /// Externally produced star-history CSV; may not exist.
    pub star_history: String,
    pub data_dir: String,
    pub plots_dir: String,
    /// Designated training file, by convention name.
    pub training_file: String,
    /// Filename used before the rename to `training_file`.
    pub legacy_training_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            changelog: "data/changelog.md".to_string(),
            history_repo: "data/speedrun-repo".to_string(),
            star_history: "data/star_history.csv".to_string(),
            data_dir: "data".to_string(),
            plots_dir: "plots".to_string(),
            training_file: "train_gpt.py".to_string(),
            legacy_training_file: "train_gpt2.py".to_string(),
        }
    }
}

impl Config {
    pub fn records_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join("records.json")
    }

    pub fn code_size_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join("code_size.json")
    }

    pub fn improvements_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join("improvements.json")
    }

    pub fn metrics_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join("metrics.json")
    }
}

pub fn load_config(dir: &Path) -> Result<Config, String> {
    let path = dir.join(CONFIG_FILE);

    if !path.exists() {
        log::info!("No {CONFIG_FILE} found, using default configuration");
        return Ok(Config::default());
    }

    let raw = fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let mut config: Config =
        serde_json::from_str(&raw).map_err(|e| format!("Malformed {}: {e}", path.display()))?;

    sanitize(&mut config);
    Ok(config)
}

fn sanitize(config: &mut Config) {
    let defaults = Config::default();
    fallback_if_empty(&mut config.changelog, defaults.changelog);
    fallback_if_empty(&mut config.history_repo, defaults.history_repo);
    fallback_if_empty(&mut config.star_history, defaults.star_history);
    fallback_if_empty(&mut config.data_dir, defaults.data_dir);
    fallback_if_empty(&mut config.plots_dir, defaults.plots_dir);
    fallback_if_empty(&mut config.training_file, defaults.training_file);
    fallback_if_empty(&mut config.legacy_training_file, defaults.legacy_training_file);
}

fn fallback_if_empty(value: &mut String, default: String) {
    if value.trim().is_empty() {
        *value = default;
    }
}
