//! Catalog error types
//!
//! Re-exports mealprep-error and provides catalog-specific conveniences.

// Re-export the core error types
pub use mealprep_error::{Error, ErrorKind, ErrorStatus, Result};

// =============================================================================
// Catalog-specific error constructors
// =============================================================================

/// Create a ProductNotFound error
pub fn product_not_found(query: impl Into<String>) -> Error {
    Error::product_not_found(query)
}

/// Create a SearchBlocked error
pub fn search_blocked(url: impl Into<String>) -> Error {
    Error::search_blocked(url)
}

/// Create an ExtractionFailed error
pub fn extraction_failed(message: impl Into<String>) -> Error {
    Error::extraction_failed(message)
}

/// Create a CacheCorrupted error
pub fn cache_corrupted(message: impl Into<String>) -> Error {
    Error::cache_corrupted(message)
}

/// Create a NetworkFailed error
pub fn network_failed(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::NetworkFailed, message)
}

/// Create a RateLimited error
pub fn rate_limited(url: impl Into<String>) -> Error {
    Error::new(ErrorKind::RateLimited, "retailer rate limit hit")
        .with_context("url", url.into())
}

/// Create a ConfigInvalid error
pub fn config_invalid(message: impl Into<String>) -> Error {
    Error::config_invalid(message)
}

/// Create an InvalidArgument error
pub fn invalid_argument(message: impl Into<String>) -> Error {
    Error::invalid_argument(message)
}

/// Create an IoFailed error
pub fn io_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::IoFailed, message)
}

/// Create a SerializationFailed error
pub fn serialization_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::SerializationFailed, message)
}
