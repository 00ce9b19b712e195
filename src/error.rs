use thiserror::Error;

/// Result type for signal-dqn operations
pub type Result<T> = std::result::Result<T, DqnError>;

/// Main error type for the training pipeline
#[derive(Debug, Error)]
pub enum DqnError {
    /// The replay buffer holds fewer transitions than a batch needs
    #[error("insufficient data: requested {requested} transitions, buffer holds {available}")]
    InsufficientData { requested: usize, available: usize },

    /// A state or observation vector has the wrong length
    #[error("shape mismatch for {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Action index outside the action space
    #[error("invalid action {action}: must be less than {action_dim}")]
    InvalidAction { action: usize, action_dim: usize },

    /// Invalid parameter value
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// The environment adapter failed; the episode in progress was abandoned
    #[error("environment failure during episode {episode}")]
    Environment {
        episode: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// IO errors (file operations)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<bincode::Error> for DqnError {
    fn from(err: bincode::Error) -> Self {
        DqnError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for DqnError {
    fn from(err: serde_json::Error) -> Self {
        DqnError::Serialization(err.to_string())
    }
}

impl DqnError {
    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        DqnError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn shape_mismatch(what: &'static str, expected: usize, actual: usize) -> Self {
        DqnError::ShapeMismatch {
            what,
            expected,
            actual,
        }
    }

    /// Whether the error only means "not enough experience yet"
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, DqnError::InsufficientData { .. })
    }
}
