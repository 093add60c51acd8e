//! Bearer token subject extraction for the GraphQL endpoint.
//!
//! Tokens are HS256 JWTs signed with `KEY_JWT`. Only the subject is used:
//! a valid token overrides any `user_id` the caller supplied. Invalid or
//! unsigned tokens are treated as absent, never as an error.

use std::collections::HashSet;

use axum::http::{header, HeaderMap};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token validation failed: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
    #[error("Token carries no usable user id")]
    NoSubject,
}

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    sub: Option<Value>,
    #[serde(default)]
    user_id: Option<Value>,
}

/// Read a positive 32-bit user id from a JSON number or numeric string.
pub fn user_id_from_json(value: &Value) -> Option<i32> {
    let id = match value {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    i32::try_from(id).ok().filter(|id| *id > 0)
}

/// Validates bearer tokens against the shared secret.
#[derive(Clone)]
pub struct JwtAuth {
    key: Option<DecodingKey>,
    validation: Validation,
}

impl JwtAuth {
    /// `None` disables token handling entirely.
    pub fn new(secret: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // `exp` is checked when present but not required.
        validation.required_spec_claims = HashSet::new();

        Self {
            key: secret.map(|s| DecodingKey::from_secret(s.as_bytes())),
            validation,
        }
    }

    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn is_enabled(&self) -> bool {
        self.key.is_some()
    }

    /// User id carried by `token`: `sub` first, then `user_id`.
    pub fn user_id(&self, token: &str) -> Result<i32, AuthError> {
        let Some(key) = &self.key else {
            return Err(AuthError::NoSubject);
        };

        let data = decode::<Claims>(token, key, &self.validation)?;
        data.claims
            .sub
            .as_ref()
            .and_then(user_id_from_json)
            .or_else(|| data.claims.user_id.as_ref().and_then(user_id_from_json))
            .ok_or(AuthError::NoSubject)
    }

    /// User id from an `Authorization: Bearer` header, if one validates.
    pub fn user_id_from_headers(&self, headers: &HeaderMap) -> Option<i32> {
        if !self.is_enabled() {
            return None;
        }

        let token = headers
            .get(header::AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?
            .trim();

        match self.user_id(token) {
            Ok(id) => Some(id),
            Err(e) => {
                debug!(error = %e, "Ignoring bearer token");
                None
            }
        }
    }
}
