use std::path::PathBuf;

/// Errors returned from [`crate::analyze`]. Every other failure kind is
/// non-fatal and is instead delivered through the warning callback as a
/// [`Warning`].
#[derive(Debug, thiserror::Error)]
pub enum UnreachError {
    #[error("project root does not exist: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("project root is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("configured entry point does not exist on disk: {0}")]
    EntryPointNotFound(PathBuf),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("internal analysis failure: {0}")]
    Analysis(#[from] anyhow::Error),
}

/// Configuration validation failures. Raised before merging with
/// defaults; the caller may retry with `--no-config`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration json: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid glob pattern {pattern:?} in {field}: {message}")]
    InvalidGlob {
        field: &'static str,
        pattern: String,
        message: String,
    },

    #[error("invalid glob pattern {pattern:?} in {field}: {source}")]
    InvalidGlobSet {
        field: &'static str,
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("{field} must be a positive number, got {value}")]
    NotPositive { field: &'static str, value: f64 },
}

/// Non-fatal conditions surfaced through the warning callback.
#[derive(Debug, Clone)]
pub enum Warning {
    ParseFailure { path: PathBuf, message: String },
    CacheIoFailure { message: String },
    StyleParseFailure { path: PathBuf, message: String },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::ParseFailure { path, message } => {
                write!(f, "failed to parse {}: {}", path.display(), message)
            }
            Warning::CacheIoFailure { message } => write!(f, "cache I/O failure: {}", message),
            Warning::StyleParseFailure { path, message } => {
                write!(f, "failed to parse style file {}: {}", path.display(), message)
            }
        }
    }
}
