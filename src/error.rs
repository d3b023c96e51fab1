//! Error types for joinery.

use thiserror::Error;

/// The main error type for joinery operations.
#[derive(Debug, Error)]
pub enum JoineryError {
    /// A join descriptor names a join kind other than INNER or LEFT.
    #[error("Unknown join type: '{0}'. Expected: INNER or LEFT")]
    UnknownJoinType(String),

    /// A predicate uses an operator symbol outside the supported set.
    #[error("Unsupported operator: '{0}'")]
    UnsupportedOperator(String),

    /// A predicate sequence closes a group that was never opened,
    /// or leaves one open under the strict policy.
    #[error("Unbalanced parenthesis at predicate {position}: {message}")]
    UnbalancedParenthesis { position: usize, message: String },

    /// Logical connector other than AND / OR.
    #[error("Unknown logical connector: '{0}'. Expected: AND, OR or empty")]
    UnknownLogic(String),

    /// Order option other than NONE / DAY / MONTH / YEAR.
    #[error("Unknown order option: '{0}'")]
    UnknownOrderOption(String),

    /// A value whose shape does not fit its operator or domain type.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// A table index with no class or no join descriptor.
    #[error("Unknown table T{index}: {message}")]
    UnknownTable { index: usize, message: String },

    /// The metadata provider has no entry for this class.
    #[error("Unknown class: '{0}'")]
    UnknownClass(String),

    /// The request wire format could not be decoded.
    #[error("Request error: {0}")]
    Request(#[from] serde_json::Error),

    /// Configuration or catalog error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error.
    #[error("Execution error: {0}")]
    Execution(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl JoineryError {
    /// Create an unbalanced parenthesis error at the given predicate position.
    pub fn unbalanced(position: usize, message: impl Into<String>) -> Self {
        Self::UnbalancedParenthesis {
            position,
            message: message.into(),
        }
    }

    /// Create an unknown table error.
    pub fn unknown_table(index: usize, message: impl Into<String>) -> Self {
        Self::UnknownTable {
            index,
            message: message.into(),
        }
    }
}

/// Result type alias for joinery operations.
pub type JoineryResult<T> = Result<T, JoineryError>;
