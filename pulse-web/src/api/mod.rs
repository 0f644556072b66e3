//! HTTP API handlers

pub mod ai;
pub mod analytics;
pub mod auth;
pub mod export;
pub mod feedback;
pub mod health;
pub mod responses;
pub mod sessions;
pub mod sse;
