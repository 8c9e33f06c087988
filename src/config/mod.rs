pub mod resolve;
pub mod validate;

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),
    #[error("no config file given and none of {0} found from the current directory upwards")]
    NoConfig(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config at {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("config at {0} must be a key/value object")]
    NotAnObject(PathBuf),
    #[error("invalid configuration:\n{}", .0.join("\n"))]
    Invalid(Vec<String>),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepoMode {
    /// Direct dependencies from the Maven manifest found in `repo`.
    Off,
    /// Adjacency lists from a test graph file.
    File,
    /// Nothing is loaded; the graph holds only `package_name`.
    Mock,
}

impl RepoMode {
    pub const NAMES: [&'static str; 4] = ["file", "local-file", "mock", "off"];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "off" => Some(RepoMode::Off),
            "file" | "local-file" => Some(RepoMode::File),
            "mock" => Some(RepoMode::Mock),
            _ => None,
        }
    }
}

impl fmt::Display for RepoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoMode::Off => f.write_str("off"),
            RepoMode::File => f.write_str("file"),
            RepoMode::Mock => f.write_str("mock"),
        }
    }
}

/// Validated configuration for one run.
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    pub package_name: String,
    pub repo: Option<String>,
    pub test_repo_mode: RepoMode,
    pub test_graph_file: Option<PathBuf>,
    pub output_image: PathBuf,
    pub max_depth: usize,
    pub filter_substring: String,
    pub renderer: Option<String>,
}

impl Settings {
    /// Adjacency file used in `file` mode.
    pub fn graph_file(&self) -> Option<PathBuf> {
        self.test_graph_file
            .clone()
            .or_else(|| self.repo.as_ref().map(PathBuf::from))
    }

    /// `(key, value)` pairs in display order, empty strings made visible.
    pub fn display_pairs(&self) -> Vec<(&'static str, String)> {
        fn shown(value: &str) -> String {
            if value.is_empty() {
                "<empty string>".to_string()
            } else {
                value.to_string()
            }
        }
        let optional = |value: Option<String>| value.unwrap_or_else(|| "<unset>".to_string());

        vec![
            ("package_name", shown(&self.package_name)),
            ("repo", optional(self.repo.clone())),
            ("test_repo_mode", self.test_repo_mode.to_string()),
            (
                "test_graph_file",
                optional(
                    self.test_graph_file
                        .as_ref()
                        .map(|path| path.display().to_string()),
                ),
            ),
            ("output_image", self.output_image.display().to_string()),
            ("max_depth", self.max_depth.to_string()),
            ("filter_substring", shown(&self.filter_substring)),
            ("renderer", optional(self.renderer.clone())),
        ]
    }
}
