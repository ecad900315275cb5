use chrono::{DateTime, Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::Serialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::auth::AuthError;
use crate::config::AuthConfig;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Serialize)]
pub struct SessionToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and checks `<user_id>.<expires_unix>.<hex hmac-sha256>` tokens.
pub struct TokenSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    /// An empty configured secret gets a random key, so tokens do not
    /// survive a restart.
    pub fn from_config(config: &AuthConfig) -> Self {
        let ttl = Duration::hours(i64::from(config.token_expiry_hours));
        if config.token_secret.is_empty() {
            let mut secret = vec![0u8; 32];
            rand::thread_rng().fill_bytes(&mut secret);
            tracing::warn!("auth.token_secret is empty, using a per-process random key");
            Self::new(secret, ttl)
        } else {
            Self::new(config.token_secret.as_bytes(), ttl)
        }
    }

    pub fn issue(&self, user_id: i64) -> Result<SessionToken, AuthError> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(&self, user_id: i64, now: DateTime<Utc>) -> Result<SessionToken, AuthError> {
        let expires_at = now + self.ttl;
        let payload = format!("{}.{}", user_id, expires_at.timestamp());
        let signature = self.sign(payload.as_bytes())?;
        Ok(SessionToken {
            token: format!("{}.{}", payload, signature),
            expires_at,
        })
    }

    /// Returns the user id the token was issued for.
    pub fn verify(&self, token: &str) -> Result<i64, AuthError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<i64, AuthError> {
        let mut parts = token.splitn(3, '.');
        let (user, expires, signature) = match (parts.next(), parts.next(), parts.next()) {
            (Some(u), Some(e), Some(s)) => (u, e, s),
            _ => return Err(AuthError::MalformedToken),
        };

        let user_id: i64 = user.parse().map_err(|_| AuthError::MalformedToken)?;
        let expires_unix: i64 = expires.parse().map_err(|_| AuthError::MalformedToken)?;

        let expected = self.sign(format!("{}.{}", user, expires).as_bytes())?;
        let provided = hex::decode(signature).map_err(|_| AuthError::MalformedToken)?;
        let expected = hex::decode(expected).map_err(|_| AuthError::MalformedToken)?;
        if provided.len() != expected.len() || !bool::from(provided.ct_eq(expected.as_slice())) {
            return Err(AuthError::BadSignature);
        }

        let expires_at = Utc
            .timestamp_opt(expires_unix, 0)
            .single()
            .ok_or(AuthError::MalformedToken)?;
        if expires_at <= now {
            return Err(AuthError::Expired);
        }

        Ok(user_id)
    }

    fn sign(&self, payload: &[u8]) -> Result<String, AuthError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).map_err(|e| AuthError::Key(e.to_string()))?;
        mac.update(payload);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}
