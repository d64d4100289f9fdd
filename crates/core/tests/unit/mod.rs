//! # Unit Components
//!
//! Unit tests grouped by the crate module they exercise.


/// Configuration loading and validation.
pub mod config;
