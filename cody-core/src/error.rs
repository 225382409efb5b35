/// Top-level Cody error type.
///
/// All fallible operations in `cody-core` return [`Result<T, CodyError>`](Result).
/// Each variant wraps a domain-specific error enum, allowing callers to
/// match on the error source without losing type information.
#[derive(thiserror::Error, Debug)]
pub enum CodyError {
    /// Error from the graph engine (unsupported types, ambiguous commands, merges).
    #[error("Analysis error: {0}")]
    Graph(#[from] cody_graph::GraphError),

    /// Diagram JSON could not be decoded into nodes.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The diagram failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Error in configuration parsing or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Filesystem I/O error reading diagrams.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors decoding board JSON.
#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    /// The payload is not valid node JSON.
    #[error("Invalid node JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A node lacks an id.
    #[error("Node without id (type \"{0}\")")]
    MissingId(String),
}

/// A single failed constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintViolation {
    /// Id of the offending node.
    pub node: String,
    /// Name of the constraint that failed.
    pub constraint: &'static str,
    pub message: String,
}

impl std::fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] node {}: {}", self.constraint, self.node, self.message)
    }
}

/// Errors raised by the validator.
#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    /// One or more constraints failed.
    #[error("Graph is invalid: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Invalid(Vec<ConstraintViolation>),
}

/// Errors in Cody configuration parsing and validation.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist at the expected path.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// Configuration values are present but semantically invalid.
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// Configuration file syntax could not be parsed (TOML error).
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Convenience alias for `Result<T, CodyError>`.
pub type Result<T> = std::result::Result<T, CodyError>;
