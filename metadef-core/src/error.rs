//! Error types for metadef-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::TypeKey;

/// All errors that can arise from reading or writing local declarations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failure, with the path it happened at.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (write path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load, with file path and line context from serde_yaml.
    #[error("failed to parse declarations at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The declaration file or directory does not exist.
    #[error("declarations not found at {path}")]
    NotFound { path: PathBuf },

    /// Two files in a declaration directory declare the same type.
    #[error("type '{type_key}' is declared in both {first} and {second}")]
    DuplicateType {
        type_key: TypeKey,
        first: PathBuf,
        second: PathBuf,
    },
}

/// All errors that can arise from loading the tool configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// No config file in any of the searched locations.
    #[error("no config file found (searched: {})", display_paths(.searched))]
    NotFound { searched: Vec<PathBuf> },

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    #[error("shop '{shop}' has no access token in {path}")]
    UnknownShop { shop: String, path: PathBuf },

    #[error("page size {0} is out of range (1..=250)")]
    PageSize(u32),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
