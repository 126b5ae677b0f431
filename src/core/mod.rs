//! Core types shared across the engine

pub mod error;

pub use error::{DispatchError, ErrorEntry, FieldError, PathSegment, ValidationError};
