//! Core types and error handling.

pub mod error;

pub use error::{ErrorContext, PodbuildError, user_friendly_error};
