use retarget_core::{ConfigError, GenerateError};
use std::path::PathBuf;

/// Errors reported by the binary. Each one ends the process with status 1.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("{}: {source}", path.display())]
    Overlay {
        path: PathBuf,
        source: ConfigError,
    },

    #[error(transparent)]
    InvalidOverlay(#[from] ConfigError),

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error("no target language given (use --to, or set defaults.target in retarget.toml)")]
    NoTarget,

    #[error("cannot tell the source dialect of {} (use --from)", .0.display())]
    UnknownExtension(PathBuf),

    #[error("stdio: {0}")]
    Stdio(#[from] std::io::Error),
}
