//! Access-tier resolution from bearer tokens.
//!
//! A missing, invalid or expired token resolves to [`AccessTier::Guest`].
//! That downgrade is a named branch of [`TokenCheck`], never an error.

use crate::error::{Result, UrlGuardError};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessTier {
    Guest,
    Authenticated,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Caller identity
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Result of inspecting the credential presented with a request.
#[derive(Debug)]
pub enum TokenCheck {
    Missing,
    Valid(Claims),
    Invalid(String),
}

/// Caller classification for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub tier: AccessTier,
    pub user_id: Option<String>,
}

impl Caller {
    pub fn guest() -> Self {
        Self {
            tier: AccessTier::Guest,
            user_id: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.tier == AccessTier::Authenticated
    }

    /// Identity of an authenticated caller, `Unauthorized` for guests.
    pub fn require_user(&self) -> Result<&str> {
        self.user_id
            .as_deref()
            .ok_or_else(|| UrlGuardError::Unauthorized("Authentication required".to_string()))
    }
}

/// Verifies HS256 access tokens and resolves callers to access tiers.
pub struct AccessResolver {
    decoding_key: DecodingKey,
}

impl AccessResolver {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Inspect the raw `Authorization` header value.
    pub fn check(&self, authorization: Option<&str>) -> TokenCheck {
        let token = match authorization.map(str::trim).filter(|h| !h.is_empty()) {
            None => return TokenCheck::Missing,
            Some(header) => header
                .strip_prefix("Bearer ")
                .or_else(|| header.strip_prefix("bearer "))
                .unwrap_or(header)
                .trim(),
        };

        if token.is_empty() {
            return TokenCheck::Missing;
        }

        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;
        validation.leeway = 0;

        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) if !data.claims.sub.trim().is_empty() => TokenCheck::Valid(data.claims),
            Ok(_) => TokenCheck::Invalid("token has an empty subject".to_string()),
            Err(e) => TokenCheck::Invalid(e.to_string()),
        }
    }

    pub fn resolve(&self, authorization: Option<&str>) -> Caller {
        match self.check(authorization) {
            TokenCheck::Missing => Caller::guest(),
            TokenCheck::Valid(claims) => Caller {
                tier: AccessTier::Authenticated,
                user_id: Some(claims.sub),
            },
            TokenCheck::Invalid(reason) => {
                tracing::debug!(reason = %reason, "Invalid access token, treating caller as guest");
                Caller::guest()
            }
        }
    }
}
