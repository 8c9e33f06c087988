use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum DepvizError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to read manifest {path}: {message}")]
    Manifest { path: PathBuf, message: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, DepvizError>;
