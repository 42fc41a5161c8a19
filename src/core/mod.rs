//! Core types shared across the guard
//!
//! - `GuardError` / `GuardResult` - Error types

pub mod error;

pub use error::{GuardError, GuardResult};
