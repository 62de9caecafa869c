//! Error types for cbstatus-core

/// Result type alias for cbstatus operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for cbstatus operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Event payload could not be decoded into a build notification
    #[error("Decode error: {0}")]
    Decode(String),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Access token could not be obtained
    #[error("Auth error: {0}")]
    Auth(String),

    /// Source Repositories API error
    #[error("Source Repositories error: {0}")]
    SourceRepo(String),

    /// GitHub API error
    #[error("GitHub error: {0}")]
    GitHub(String),

    /// Mirror URL does not name an owner/repository pair
    #[error("Invalid mirror URL: {0}")]
    MirrorUrl(String),

    /// Runtime error (Tokio, server startup, etc.)
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(format!("JSON error: {}", err))
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error::Decode(format!("base64 error: {}", err))
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Error::Decode(format!("payload is not UTF-8: {}", err))
    }
}

/// Fieldless error category for cheap matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorKind {
    /// Payload decode error
    Decode,
    /// Configuration error
    Config,
    /// Token acquisition error
    Auth,
    /// Source Repositories API error
    SourceRepo,
    /// GitHub API error
    GitHub,
    /// Mirror URL parse error
    MirrorUrl,
    /// Runtime error
    Runtime,
}

impl Error {
    /// Get the error kind
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Error::Decode(_) => ErrorKind::Decode,
            Error::Config(_) => ErrorKind::Config,
            Error::Auth(_) => ErrorKind::Auth,
            Error::SourceRepo(_) => ErrorKind::SourceRepo,
            Error::GitHub(_) => ErrorKind::GitHub,
            Error::MirrorUrl(_) => ErrorKind::MirrorUrl,
            Error::Runtime(_) => ErrorKind::Runtime,
        }
    }

    /// Borrow the error message
    #[inline]
    pub fn message(&self) -> &str {
        match self {
            Error::Decode(msg)
            | Error::Config(msg)
            | Error::Auth(msg)
            | Error::SourceRepo(msg)
            | Error::GitHub(msg)
            | Error::MirrorUrl(msg)
            | Error::Runtime(msg) => msg,
        }
    }

    /// True when the failure is caused by the event itself rather than a
    /// remote service, so redelivering the same event cannot succeed.
    #[inline]
    pub const fn is_client_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::Decode | ErrorKind::MirrorUrl)
    }
}
