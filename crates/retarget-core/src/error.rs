//! Error types for overlay loading, rendering and generation.

use retarget_syntax::ReadError;

/// An overlay document that cannot be turned into a catalog.
///
/// Every variant that stems from a single entry names the offending key.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("overlay is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("overlay document must be a mapping at the top level")]
    NotAMapping,

    #[error("`{key}`: {reason}")]
    Rule { key: String, reason: String },

    #[error("`{key}`: invalid type expression `{expr}`: {reason}")]
    TypeExpr {
        key: String,
        expr: String,
        reason: String,
    },

    #[error("`{key}`: unknown side effect `{action}` (expected use(name) or temp(base))")]
    SideEffect { key: String, action: String },

    #[error("template `{id}`: {reason}")]
    Template { id: String, reason: String },

    #[error("`{key}` refers to template `{template}`, which is not defined")]
    UnknownTemplate { key: String, template: String },

    #[error("unknown target `{name}` (available: {available})")]
    UnknownTarget { name: String, available: String },
}

/// Rendering failures. These point at an inconsistent overlay, not bad input.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no template `{0}` in overlay")]
    UnknownTemplate(String),

    #[error("{kind} node on line {line} needs template `{template}`, which the overlay does not define")]
    MissingTemplate {
        kind: String,
        template: String,
        line: u32,
    },
}

/// Anything that can stop a generation run.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("no front end for dialect `{0}`")]
    UnknownDialect(String),

    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Render(#[from] RenderError),
}
