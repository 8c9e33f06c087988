use std::env;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::config::validate::validate_config;
use crate::config::{ConfigError, Settings};

pub const CONFIG_FILE_NAMES: [&str; 4] =
    ["depviz.json", "depviz.toml", "depviz.yaml", "depviz.yml"];

/// Config path from the explicit flag, then `DEPVIZ_CONFIG`, then the first
/// `depviz.*` file found walking up from `start`.
pub fn resolve_config_path(
    start: impl AsRef<Path>,
    config_path: Option<PathBuf>,
) -> Result<PathBuf, ConfigError> {
    if let Some(path) = config_path {
        return Ok(path);
    }

    if let Ok(path) = env::var("DEPVIZ_CONFIG") {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    for ancestor in start.as_ref().ancestors() {
        for name in CONFIG_FILE_NAMES {
            let candidate = ancestor.join(name);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
    }

    Err(ConfigError::NoConfig(CONFIG_FILE_NAMES.join(", ")))
}

/// Reads the config document as a generic object. The format follows the
/// file extension; anything unrecognised is read as JSON.
pub fn load_raw_config(path: &Path) -> Result<Map<String, Value>, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
    }

    let contents = std::fs::read_to_string(path)?;
    let parse_error = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let value: Value = match extension.as_deref() {
        Some("toml") => toml::from_str(&contents).map_err(|err| parse_error(err.to_string()))?,
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(&contents).map_err(|err| parse_error(err.to_string()))?
        }
        _ => serde_json::from_str(&contents).map_err(|err| parse_error(err.to_string()))?,
    };

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ConfigError::NotAnObject(path.to_path_buf())),
    }
}

pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let raw = load_raw_config(path)?;
    let mut settings = validate_config(&raw)?;
    apply_env_overrides(&mut settings);
    tracing::debug!(path = %path.display(), ?settings, "configuration loaded");
    Ok(settings)
}

fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(renderer) = env::var("DEPVIZ_RENDERER") {
        if !renderer.trim().is_empty() {
            settings.renderer = Some(renderer.trim().to_string());
        }
    }
}
