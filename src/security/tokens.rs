//! Signed bearer tokens
//!
//! A token is `base64url(json claims) "." hex(mac)` where the MAC is a BLAKE3
//! keyed hash of the encoded claims. The key is derived from the configured
//! secret, so rotating the secret invalidates every outstanding token.

use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::types::{RecordId, Role, Timestamp, User};

const KEY_CONTEXT: &str = "eco-grid 2024-01-01 bearer token mac";

/// Payload carried by a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id
    pub sub: RecordId,
    /// Role at issue time
    pub role: Role,
    /// Expiry as a unix timestamp in seconds
    pub exp: i64,
}

/// Token handed to the client after login or registration
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    /// Bearer token
    pub token: String,
    /// When it stops being accepted
    pub expires_at: Timestamp,
}

/// Issues and verifies bearer tokens
#[derive(Clone)]
pub struct TokenSigner {
    key: [u8; 32],
    ttl: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl TokenSigner {
    /// Signer keyed from `secret`
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            key: blake3::derive_key(KEY_CONTEXT, secret.as_bytes()),
            ttl,
        }
    }

    /// Signer with a random key that lives only as long as this process
    pub fn ephemeral(ttl: Duration) -> Self {
        Self {
            key: rand::random(),
            ttl,
        }
    }

    /// Token for `user`, valid for the configured lifetime
    pub fn issue(&self, user: &User) -> Result<IssuedToken> {
        self.issue_at(user, chrono::Utc::now())
    }

    fn issue_at(&self, user: &User, now: Timestamp) -> Result<IssuedToken> {
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| Error::config(format!("token ttl out of range: {}", e)))?;
        let expires_at = now + ttl;

        let claims = Claims {
            sub: user.id,
            role: user.role,
            exp: expires_at.timestamp(),
        };
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let mac = self.mac(&payload);

        Ok(IssuedToken {
            token: format!("{}.{}", payload, mac.to_hex()),
            expires_at,
        })
    }

    /// Claims of a well-formed, correctly signed, unexpired token
    pub fn verify(&self, token: &str) -> Result<Claims> {
        self.verify_at(token, chrono::Utc::now())
    }

    fn verify_at(&self, token: &str, now: Timestamp) -> Result<Claims> {
        let (payload, signature) = token
            .split_once('.')
            .ok_or_else(|| Error::unauthorized("malformed token"))?;

        let signature: [u8; 32] = hex::decode(signature)
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| Error::unauthorized("malformed token signature"))?;

        // blake3::Hash equality is constant time
        if self.mac(payload) != blake3::Hash::from(signature) {
            return Err(Error::unauthorized("invalid token signature"));
        }

        let claims: Claims = URL_SAFE_NO_PAD
            .decode(payload)
            .ok()
            .and_then(|json| serde_json::from_slice(&json).ok())
            .ok_or_else(|| Error::unauthorized("malformed token payload"))?;

        if claims.exp <= now.timestamp() {
            return Err(Error::unauthorized("token expired"));
        }

        Ok(claims)
    }

    fn mac(&self, payload: &str) -> blake3::Hash {
        blake3::keyed_hash(&self.key, payload.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        User::new("ada@eco-grid.io", "Ada", role, "salt".into(), "hash".into())
    }

    fn signer() -> TokenSigner {
        TokenSigner::new("test-secret-with-enough-length", Duration::from_secs(3600))
    }

    #[test]
    fn test_issue_then_verify() {
        let user = user(Role::Editor);
        let issued = signer().issue(&user).unwrap();
        let claims = signer().verify(&issued.token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, Role::Editor);
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let issued = signer().issue(&user(Role::User)).unwrap();
        let (_, mac) = issued.token.split_once('.').unwrap();

        let forged_claims = Claims {
            sub: crate::types::new_id(),
            role: Role::Admin,
            exp: i64::MAX,
        };
        let forged = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap()),
            mac
        );
        assert_eq!(signer().verify(&forged).unwrap_err().status_code(), 401);
    }

    #[test]
    fn test_other_secret_rejected() {
        let issued = signer().issue(&user(Role::User)).unwrap();
        let other = TokenSigner::new("a-completely-different-secret", Duration::from_secs(3600));
        assert!(other.verify(&issued.token).is_err());
    }

    #[test]
    fn test_ephemeral_keys_differ() {
        let ttl = Duration::from_secs(3600);
        let a = TokenSigner::ephemeral(ttl);
        let issued = a.issue(&user(Role::Admin)).unwrap();
        assert!(a.verify(&issued.token).is_ok());
        assert!(TokenSigner::ephemeral(ttl).verify(&issued.token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let signer = signer();
        let issued_at = chrono::Utc::now() - chrono::Duration::hours(2);
        let issued = signer.issue_at(&user(Role::User), issued_at).unwrap();
        let err = signer.verify(&issued.token).unwrap_err();
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn test_garbage_rejected() {
        for token in ["", "abc", "abc.def", "abc.zz", "."] {
            assert!(signer().verify(token).is_err(), "{token:?} accepted");
        }
    }
}
