//! External service clients

pub mod ai_client;

pub use ai_client::{AiClient, AiError, AnalysisKind};
