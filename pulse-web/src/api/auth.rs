//! Admin authentication
//!
//! The shared admin password is compared server-side only; a successful login
//! issues a short-lived opaque bearer token held in memory. The credential
//! never reaches the client beyond the login form submission itself.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

/// Token lifetime; expired tokens are purged on the next issue/validate
const TOKEN_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// In-memory store of issued admin tokens
#[derive(Clone, Default)]
pub struct AdminTokens {
    inner: Arc<Mutex<HashMap<String, Instant>>>,
}

impl AdminTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh token
    pub fn issue(&self) -> String {
        let token = Uuid::new_v4().to_string();
        let mut tokens = self.inner.lock().expect("token store poisoned");
        tokens.retain(|_, issued| issued.elapsed() < TOKEN_TTL);
        tokens.insert(token.clone(), Instant::now());
        token
    }

    /// Check a token, rejecting unknown or expired ones
    pub fn is_valid(&self, token: &str) -> bool {
        let mut tokens = self.inner.lock().expect("token store poisoned");
        match tokens.get(token) {
            Some(issued) if issued.elapsed() < TOKEN_TTL => true,
            Some(_) => {
                tokens.remove(token);
                false
            }
            None => false,
        }
    }

    #[cfg(test)]
    fn backdate(&self, token: &str, age: Duration) {
        let mut tokens = self.inner.lock().unwrap();
        if let Some(issued) = tokens.get_mut(token) {
            *issued = Instant::now() - age;
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

/// POST /api/admin/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if request.password != state.config.admin_password {
        warn!("Admin login rejected: wrong password");
        return Err(ApiError::Unauthorized("Invalid password".to_string()));
    }

    let token = state.tokens.issue();
    info!("Admin login accepted, token issued");

    Ok(Json(json!({
        "token": token,
        "expires_in_seconds": TOKEN_TTL.as_secs(),
    })))
}

/// Middleware guarding admin routes: requires `Authorization: Bearer <token>`
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

    if !state.tokens.is_valid(token) {
        return Err(ApiError::Unauthorized("Invalid or expired token".to_string()));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_validates() {
        let tokens = AdminTokens::new();
        let token = tokens.issue();
        assert!(tokens.is_valid(&token));
        assert!(!tokens.is_valid("not-a-token"));
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = AdminTokens::new();
        let token = tokens.issue();
        tokens.backdate(&token, TOKEN_TTL + Duration::from_secs(1));
        assert!(!tokens.is_valid(&token));
        // and it is gone afterwards
        assert!(!tokens.is_valid(&token));
    }
}
