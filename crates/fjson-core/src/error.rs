//! Error types for fjson operations

/// Result type alias for fjson operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for fjson operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Grammar violation or truncated input
    #[error("invalid JSON at byte {position}: {message}")]
    StructuralParse {
        /// Byte offset in the input where the error occurred
        position: usize,
        /// Error description
        message: String,
    },

    /// Scalar reader invoked against an incompatible token
    #[error("type mismatch at byte {position}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Byte offset of the offending token
        position: usize,
        /// What the reader was asked to produce
        expected: &'static str,
        /// Token kind actually present
        found: &'static str,
    },

    /// The resolver chain produced no formatter for the requested type
    #[error("no formatter registered for `{type_name}`")]
    UnsupportedType {
        /// Diagnostic name of the unresolved type
        type_name: &'static str,
    },

    /// Internal bug guard; not recoverable
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl Error {
    /// Create a structural parse error at the given byte offset
    pub fn structural(position: usize, message: impl Into<String>) -> Self {
        Self::StructuralParse {
            position,
            message: message.into(),
        }
    }

    /// Create a premature end-of-input error
    pub fn eof(position: usize) -> Self {
        Self::structural(position, "unexpected end of input")
    }

    /// Create a type mismatch error
    pub fn mismatch(position: usize, expected: &'static str, found: &'static str) -> Self {
        Self::TypeMismatch {
            position,
            expected,
            found,
        }
    }

    /// Create an unsupported type error
    pub fn unsupported(type_name: &'static str) -> Self {
        Self::UnsupportedType { type_name }
    }

    /// Create an invariant violation error
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }

    /// Byte offset associated with the error, when one exists
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::StructuralParse { position, .. } | Self::TypeMismatch { position, .. } => {
                Some(*position)
            }
            _ => None,
        }
    }
}
