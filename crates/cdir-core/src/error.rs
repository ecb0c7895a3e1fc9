//! # Error Types
//!
//! The directory error taxonomy. Every Directory implementation and the
//! registry report failures through [`DirectoryError`]; callers map the
//! [`ErrorCategory`] onto their own surface (HTTP status, exit code).
//!
//! ## Propagation
//!
//! - Contract and format errors are raised before any remote I/O.
//! - Remote failures are wrapped as [`DirectoryError::Internal`] by the
//!   directory that observed them. Only `NotFound` and `Primary` are ever
//!   passed through from the inner algorithm unchanged.

use thiserror::Error;

/// Broad classification of a [`DirectoryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The caller sent something it can correct.
    BadRequest,
    /// Nothing resolvable exists.
    NotFound,
    /// Unexpected failure inside this service or a collaborator.
    Internal,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest => write!(f, "BadRequest"),
            Self::NotFound => write!(f, "NotFound"),
            Self::Internal => write!(f, "Internal"),
        }
    }
}

/// Errors raised by directories, the registry, and the resolver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// A directory violated the registration contract.
    #[error("{0}")]
    InvalidDirectory(String),

    /// The identifier is not in the format the directory accepts.
    #[error("{0}")]
    InvalidIdentifier(String),

    /// No resolvable record exists for the identifier.
    #[error("{0}")]
    NotFound(String),

    /// The change would leave the identifier without a primary owner.
    #[error("{0}")]
    Primary(String),

    /// A downstream service rejected the request as malformed.
    #[error("{0}")]
    BadRequest(String),

    /// The identifier is already registered by this DFSP.
    #[error("{0}")]
    AlreadyExists(String),

    /// A downstream service answered with a body that could not be used.
    #[error("{0}")]
    InvalidResponse(String),

    /// The directory cannot register identifiers.
    #[error("directory '{identifier_type}' does not support identifier registration")]
    RegistrationUnsupported {
        /// The identifier type of the directory.
        identifier_type: String,
    },

    /// No directory is registered for the requested identifier type.
    #[error("'{0}' is not a registered identifierType")]
    UnknownIdentifierType(String),

    /// Unexpected failure, already logged with its cause.
    #[error("{0}")]
    Internal(String),
}

impl DirectoryError {
    /// Classify the error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidIdentifier(_)
            | Self::Primary(_)
            | Self::BadRequest(_)
            | Self::AlreadyExists(_)
            | Self::RegistrationUnsupported { .. }
            | Self::UnknownIdentifierType(_) => ErrorCategory::BadRequest,
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::InvalidDirectory(_) | Self::InvalidResponse(_) | Self::Internal(_) => {
                ErrorCategory::Internal
            }
        }
    }

    /// Stable name of the error kind, used in logs and structured output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::InvalidDirectory(_) => "InvalidDirectoryError",
            Self::InvalidIdentifier(_) => "InvalidIdentifierError",
            Self::NotFound(_) => "NotFoundError",
            Self::Primary(_) => "PrimaryError",
            Self::BadRequest(_) => "BadRequestError",
            Self::AlreadyExists(_) => "AlreadyExistsError",
            Self::InvalidResponse(_) => "InvalidResponseError",
            Self::RegistrationUnsupported { .. } => "RegistrationUnsupportedError",
            Self::UnknownIdentifierType(_) => "InvalidQueryParameterError",
            Self::Internal(_) => "InternalError",
        }
    }
}

/// Error constructing a validated newtype.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Not an E.164 phone number.
    #[error("The phone number must be in E.164 format")]
    InvalidPhoneNumber(String),

    /// Identifier type is empty.
    #[error("identifier type must not be empty")]
    EmptyIdentifierType,

    /// Identifier type contains separators or whitespace.
    #[error("identifier type '{0}' must be a plain token")]
    InvalidIdentifierType(String),
}

impl From<ValidationError> for DirectoryError {
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::InvalidPhoneNumber(_) => Self::InvalidIdentifier(e.to_string()),
            ValidationError::EmptyIdentifierType | ValidationError::InvalidIdentifierType(_) => {
                Self::InvalidDirectory(e.to_string())
            }
        }
    }
}
