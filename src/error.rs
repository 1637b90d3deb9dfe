//! Error types
//!
//! Extraction never fails: missing nodes, missing attributes and unparseable
//! dates all produce empty strings. Errors come from building a rule set
//! (a caller contract violation) and from rendering.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed rule set: missing maps, unknown names, misplaced options
    #[error("invalid rule set: {0}")]
    Config(String),

    #[error("invalid selector `{selector}`: {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("failed to parse rules as JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse rules as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to render feed: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, Error>;
