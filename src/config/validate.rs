use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::config::{ConfigError, RepoMode, Settings};

pub const DEFAULT_MAX_DEPTH: usize = 1000;
pub const IMAGE_EXTENSIONS: [&str; 3] = ["pdf", "png", "svg"];

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?i)(https?|git|ssh)://(?P<rest>.*)$").expect("static url pattern")
    })
}

/// Validates every field and reports all problems together.
pub fn validate_config(raw: &Map<String, Value>) -> Result<Settings, ConfigError> {
    let mut errors = Vec::new();

    let package_name = required_string(raw, "package_name", &mut errors);

    let mode = match raw.get("test_repo_mode") {
        None | Some(Value::Null) => {
            errors.push("missing required field 'test_repo_mode'".to_string());
            None
        }
        Some(Value::String(value)) => {
            let parsed = RepoMode::parse(value.trim());
            if parsed.is_none() {
                errors.push(format!(
                    "invalid 'test_repo_mode' value '{value}', expected one of: {}",
                    RepoMode::NAMES.join(", ")
                ));
            }
            parsed
        }
        Some(_) => {
            errors.push("'test_repo_mode' must be a string".to_string());
            None
        }
    };

    let repo = optional_string(raw, "repo", &mut errors);
    if let Some(repo) = repo.as_deref() {
        if repo.is_empty() {
            errors.push("'repo' must be a non-empty string (URL or local path)".to_string());
        } else if let Some(captures) = url_pattern().captures(repo) {
            let rest = captures.name("rest").map_or("", |m| m.as_str());
            if rest.trim_matches('/').is_empty() {
                errors.push(format!("'repo' looks like a URL but has no host or path: {repo}"));
            }
        }
    }

    let test_graph_file = optional_string(raw, "test_graph_file", &mut errors).map(PathBuf::from);

    match mode {
        Some(RepoMode::Off) => match repo.as_deref() {
            None => errors.push("'repo' is required when 'test_repo_mode' is 'off'".to_string()),
            Some(repo) if !repo.is_empty() && !is_url(repo) && !Path::new(repo).is_dir() => {
                errors.push(format!("repository directory does not exist: {repo}"));
            }
            _ => {}
        },
        Some(RepoMode::File) => match (&test_graph_file, repo.as_deref()) {
            (Some(path), _) => {
                if !path.is_file() {
                    errors.push(format!("'test_graph_file' does not exist: {}", path.display()));
                }
            }
            (None, Some(repo)) if !repo.is_empty() => {
                if !Path::new(repo).is_file() {
                    errors.push(format!(
                        "'test_repo_mode' is 'file' but the path in 'repo' does not exist: {repo}"
                    ));
                }
            }
            (None, Some(_)) => {}
            (None, None) => errors.push(
                "'test_graph_file' is required when 'test_repo_mode' is 'file'".to_string(),
            ),
        },
        Some(RepoMode::Mock) | None => {}
    }

    let output_image = required_string(raw, "output_image", &mut errors).map(PathBuf::from);
    if let Some(image) = &output_image {
        match image.extension().and_then(|ext| ext.to_str()) {
            None => errors.push(format!(
                "'output_image' needs an extension ({})",
                IMAGE_EXTENSIONS.join(", ")
            )),
            Some(ext) if !IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) => {
                errors.push(format!(
                    "unsupported 'output_image' extension '.{ext}', expected one of: {}",
                    IMAGE_EXTENSIONS.join(", ")
                ));
            }
            Some(_) => {}
        }
    }

    let max_depth = match raw.get("max_depth") {
        None | Some(Value::Null) => Some(DEFAULT_MAX_DEPTH),
        Some(Value::Bool(_)) => {
            errors.push("'max_depth' must be an integer >= 0, not a boolean".to_string());
            None
        }
        Some(Value::Number(number)) => match number.as_u64() {
            Some(value) => usize::try_from(value).ok().or_else(|| {
                errors.push(format!("'max_depth' is too large: {value}"));
                None
            }),
            None if number.as_i64().is_some() => {
                errors.push("'max_depth' must be >= 0".to_string());
                None
            }
            None => {
                errors.push("'max_depth' must be an integer".to_string());
                None
            }
        },
        Some(_) => {
            errors.push("'max_depth' must be an integer".to_string());
            None
        }
    };

    let filter_substring = match raw.get("filter_substring") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(value)) => value.clone(),
        Some(_) => {
            errors.push("'filter_substring' must be a string (may be empty)".to_string());
            String::new()
        }
    };

    let renderer = optional_string(raw, "renderer", &mut errors).filter(|value| !value.is_empty());

    match (package_name, mode, output_image, max_depth) {
        (Some(package_name), Some(test_repo_mode), Some(output_image), Some(max_depth))
            if errors.is_empty() =>
        {
            Ok(Settings {
                package_name,
                repo: repo.filter(|value| !value.is_empty()),
                test_repo_mode,
                test_graph_file,
                output_image,
                max_depth,
                filter_substring,
                renderer,
            })
        }
        _ => Err(ConfigError::Invalid(errors)),
    }
}

fn is_url(value: &str) -> bool {
    url_pattern().is_match(value)
}

fn required_string(
    raw: &Map<String, Value>,
    key: &str,
    errors: &mut Vec<String>,
) -> Option<String> {
    match raw.get(key) {
        None | Some(Value::Null) => {
            errors.push(format!("missing required field '{key}'"));
            None
        }
        Some(Value::String(value)) if !value.trim().is_empty() => Some(value.trim().to_string()),
        Some(_) => {
            errors.push(format!("'{key}' must be a non-empty string"));
            None
        }
    }
}

fn optional_string(
    raw: &Map<String, Value>,
    key: &str,
    errors: &mut Vec<String>,
) -> Option<String> {
    match raw.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(value)) => Some(value.trim().to_string()),
        Some(_) => {
            errors.push(format!("'{key}' must be a string"));
            None
        }
    }
}
