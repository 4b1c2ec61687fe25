//! # mealprep-error
//!
//! Unified error handling for the meal prep agent - following OpenDAL's error
//! handling practices.
//!
//! ## Design Philosophy
//!
//! - **ErrorKind**: Know what error occurred (e.g., ProductNotFound, InferenceFailed)
//! - **ErrorStatus**: Decide how to handle it (Permanent, Temporary, Persistent)
//! - **Error Context**: Assist in locating the cause with rich context
//! - **Error Source**: Wrap underlying errors without leaking raw types
//!
//! ## Usage
//!
//! ```rust
//! use mealprep_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::ProductNotFound, "no products matched 'dragon fruit'")
//!         .with_operation("catalog::search")
//!         .with_context("query", "dragon fruit")
//!         .with_context("backend", "web"))
//! }
//! ```
//!
//! ## Principles
//!
//! - All fallible functions return `Result<T, mealprep_error::Error>`
//! - External errors are wrapped with `set_source(err)`
//! - Same error handled once, subsequent ops only append context
//! - Don't abuse `From<OtherError>` to prevent raw error leakage

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using the meal prep Error
pub type Result<T> = std::result::Result<T, Error>;
