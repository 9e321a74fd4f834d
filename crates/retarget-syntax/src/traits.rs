//! Trait for front ends (readers).

use crate::ir::Program;

/// Error that can occur when reading source code into the tree.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("unsupported syntax: {0}")]
    Unsupported(String),
}

/// A reader parses one surface dialect into the normalized tree.
pub trait Reader: Send + Sync {
    /// Dialect identifier (e.g., "python", "json").
    fn dialect(&self) -> &'static str;

    /// File extensions this reader handles (e.g., &["py"]).
    fn extensions(&self) -> &'static [&'static str];

    /// Parse source code into the tree.
    fn read(&self, source: &str) -> Result<Program, ReadError>;
}
