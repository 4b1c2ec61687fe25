//! Error kinds for meal prep agent operations

use std::fmt;

/// The kind of error that occurred.
///
/// This enum categorizes errors to help users write clear error handling logic.
/// Users can match on ErrorKind to decide how to handle specific error cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General errors
    // =========================================================================
    /// An unexpected error occurred - catch-all for unhandled cases
    Unexpected,

    /// The requested feature or operation is not supported
    Unsupported,

    /// Invalid configuration or parameters
    ConfigInvalid,

    /// Invalid argument passed to function
    InvalidArgument,

    // =========================================================================
    // Catalog errors
    // =========================================================================
    /// No products matched the search query
    ProductNotFound,

    /// The retailer served a bot wall or an empty shell page
    SearchBlocked,

    /// Product data could not be extracted from the page
    ExtractionFailed,

    // =========================================================================
    // Cache errors
    // =========================================================================
    /// The cache file exists but cannot be understood
    CacheCorrupted,

    /// Serialization/deserialization failed
    SerializationFailed,

    // =========================================================================
    // Inference/agent errors
    // =========================================================================
    /// LLM inference failed
    InferenceFailed,

    /// Rate limit exceeded
    RateLimited,

    /// The model called a tool that does not exist
    ToolUnknown,

    /// The agent loop ran out of turns before producing an answer
    TurnLimitExceeded,

    // =========================================================================
    // IO errors
    // =========================================================================
    /// File not found
    FileNotFound,

    /// Permission denied
    PermissionDenied,

    /// IO operation failed
    IoFailed,

    /// Network error
    NetworkFailed,

    // =========================================================================
    // Parse errors
    // =========================================================================
    /// Failed to parse input
    ParseFailed,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            // General
            ErrorKind::Unexpected => "Unexpected",
            ErrorKind::Unsupported => "Unsupported",
            ErrorKind::ConfigInvalid => "ConfigInvalid",
            ErrorKind::InvalidArgument => "InvalidArgument",

            // Catalog
            ErrorKind::ProductNotFound => "ProductNotFound",
            ErrorKind::SearchBlocked => "SearchBlocked",
            ErrorKind::ExtractionFailed => "ExtractionFailed",

            // Cache
            ErrorKind::CacheCorrupted => "CacheCorrupted",
            ErrorKind::SerializationFailed => "SerializationFailed",

            // Inference/agent
            ErrorKind::InferenceFailed => "InferenceFailed",
            ErrorKind::RateLimited => "RateLimited",
            ErrorKind::ToolUnknown => "ToolUnknown",
            ErrorKind::TurnLimitExceeded => "TurnLimitExceeded",

            // IO
            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::PermissionDenied => "PermissionDenied",
            ErrorKind::IoFailed => "IoFailed",
            ErrorKind::NetworkFailed => "NetworkFailed",

            // Parse
            ErrorKind::ParseFailed => "ParseFailed",
        }
    }

    /// Check if this error kind is retryable by default
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::InferenceFailed
                | ErrorKind::NetworkFailed
                | ErrorKind::RateLimited
                | ErrorKind::SearchBlocked
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
