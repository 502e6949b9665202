//! Utility types and functions for XUR.
//!
//! This module contains fundamental types used throughout the library:
//! - [`Vector`] / [`Quaternion`] - Float value types carried by properties
//! - [`Error`] / [`Result`] - Error handling

mod error;
mod vector;

pub use error::*;
pub use vector::*;
