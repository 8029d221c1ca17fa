//! Identity gate: turns request headers into an authenticated principal.
//!
//! # Invariants
//! - The server never verifies credentials itself; a gate either yields a
//!   principal or nothing.
//! - A gate is consulted before any request body is read.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use codeconnect_core::Principal;
use log::debug;

use crate::error::{unauthorized, ApiError};
use crate::AppState;

pub const PRINCIPAL_ID_HEADER: &str = "x-principal-id";
pub const PRINCIPAL_EMAIL_HEADER: &str = "x-principal-email";
pub const PRINCIPAL_NAME_HEADER: &str = "x-principal-name";
pub const PRINCIPAL_CREATED_AT_HEADER: &str = "x-principal-created-at";

/// Resolves the principal of a request, if any.
pub trait IdentityGate: Send + Sync {
    fn authenticate(&self, headers: &HeaderMap) -> Option<Principal>;
}

/// Trusts principal headers forwarded by an upstream auth proxy.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustedHeaderGate;

impl IdentityGate for TrustedHeaderGate {
    fn authenticate(&self, headers: &HeaderMap) -> Option<Principal> {
        let id = header_text(headers, PRINCIPAL_ID_HEADER)?;
        let mut principal = Principal::new(id);
        if let Some(email) = header_text(headers, PRINCIPAL_EMAIL_HEADER) {
            principal = principal.with_email(email);
        }
        if let Some(name) = header_text(headers, PRINCIPAL_NAME_HEADER) {
            principal = principal.with_display_name(name);
        }
        // Unparseable account timestamps fall back to 0.
        if let Some(created_at) = header_text(headers, PRINCIPAL_CREATED_AT_HEADER)
            .and_then(|value| value.parse::<i64>().ok())
        {
            principal = principal.with_created_at(created_at);
        }
        Some(principal)
    }
}

/// Non-blank, UTF-8 header value.
fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Extractor for handlers that require a principal; rejects with 401.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Principal);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match state.gate.authenticate(&parts.headers) {
            Some(principal) => Ok(Self(principal)),
            None => {
                debug!(
                    "event=auth_reject module=server status=error method={} path={}",
                    parts.method,
                    parts.uri.path()
                );
                Err(unauthorized())
            }
        }
    }
}
