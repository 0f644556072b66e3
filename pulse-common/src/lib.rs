//! # SessionPulse Common Library
//!
//! Shared code for the SessionPulse service:
//! - Domain models (Session, Question, Response, answer values)
//! - Common error type
//! - Configuration loading

pub mod config;
pub mod error;
pub mod models;

pub use error::{Error, Result};
