//! Error types for exampleset.

/// Result type alias for exampleset operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or scanning example sets.
///
/// Construction-time validation fails fast with one of these variants.
/// Out-of-bounds row access on a view is a contract violation and panics
/// instead of returning an error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Partition ratios are empty, negative or do not sum to one.
    #[error("Invalid partition ratios: {message}")]
    InvalidRatios {
        /// Description of the problem.
        message: String,
    },

    /// Two inputs that must have the same length do not.
    #[error("{what}: expected length {expected}, got {actual}")]
    LengthMismatch {
        /// Which input was checked.
        what: String,
        /// Required length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },

    /// An index (mapping entry, group number, ...) lies outside its domain.
    #[error("Index {index} out of range [0, {len})")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Size of the valid range.
        len: usize,
    },

    /// No attribute with the given name exists in the example set.
    #[error("Attribute '{name}' not found")]
    AttributeNotFound {
        /// The missing attribute name.
        name: String,
    },

    /// A transformation does not fit the attribute it is attached to.
    #[error("Cannot attach {transformation} to attribute '{attribute}': {reason}")]
    InvalidTransformation {
        /// Transformation kind.
        transformation: &'static str,
        /// Attribute name.
        attribute: String,
        /// Why it was rejected.
        reason: String,
    },

    /// No condition factory is registered under this tag.
    #[error("Unknown condition '{tag}'")]
    UnknownCondition {
        /// The requested tag.
        tag: String,
    },

    /// A condition parameter string could not be parsed.
    #[error("Invalid condition: {message}")]
    InvalidCondition {
        /// Description of the parse failure.
        message: String,
    },

    /// A condition could not be evaluated for a row.
    #[error("Cannot evaluate condition at row {row}: {message}")]
    Evaluation {
        /// Row that failed. Conditions report the physical row; view scans
        /// replace it with the position in the scanned view.
        row: usize,
        /// Description of the failure.
        message: String,
    },

    /// Stratified sampling was requested in strict mode without a nominal label.
    #[error("Stratified sampling requires a nominal label attribute: {message}")]
    StratificationUnavailable {
        /// Description of what was found instead.
        message: String,
    },

    /// Generic invalid argument.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the argument error.
        message: String,
    },

    /// Configuration could not be loaded.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// A long scan observed its cancellation token and stopped.
    #[error("Operation stopped by cancellation request")]
    Stopped,
}

impl Error {
    /// Create an invalid ratios error.
    pub fn invalid_ratios(message: impl Into<String>) -> Self {
        Self::InvalidRatios {
            message: message.into(),
        }
    }

    /// Create a length mismatch error.
    pub fn length_mismatch(what: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::LengthMismatch {
            what: what.into(),
            expected,
            actual,
        }
    }

    /// Create an attribute not found error.
    pub fn attribute_not_found(name: impl Into<String>) -> Self {
        Self::AttributeNotFound { name: name.into() }
    }

    /// Create an invalid condition error.
    pub fn invalid_condition(message: impl Into<String>) -> Self {
        Self::InvalidCondition {
            message: message.into(),
        }
    }

    /// Create a per-row evaluation error.
    pub fn evaluation(row: usize, message: impl Into<String>) -> Self {
        Self::Evaluation {
            row,
            message: message.into(),
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Re-address an evaluation error to `row`. Other errors pass through.
    pub fn at_row(self, row: usize) -> Self {
        match self {
            Self::Evaluation { message, .. } => Self::Evaluation { row, message },
            other => other,
        }
    }

    /// Returns true if this is the cooperative stop signal rather than a failure.
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::config(err.to_string())
    }
}
