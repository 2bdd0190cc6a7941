//! Salted password hashing

use crate::core::{Error, Result};

const HASH_CONTEXT: &str = "eco-grid 2024-01-01 password hash";

/// Shortest accepted password
pub const MIN_PASSWORD_LEN: usize = 8;

/// Salt and hash, both hex encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash {
    /// Random per-account salt
    pub salt: String,
    /// Derived hash
    pub hash: String,
}

/// Hash a new password with a fresh random salt
pub fn hash_password(password: &str) -> Result<PasswordHash> {
    check_strength(password)?;

    let salt: [u8; 16] = rand::random();
    let hash = derive(&salt, password);

    Ok(PasswordHash {
        salt: hex::encode(salt),
        hash: hash.to_hex().to_string(),
    })
}

/// True when `password` matches the stored salt and hash
pub fn verify_password(password: &str, salt_hex: &str, hash_hex: &str) -> bool {
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    let Some(expected) = hex::decode(hash_hex)
        .ok()
        .and_then(|bytes| <[u8; 32]>::try_from(bytes).ok())
    else {
        return false;
    };

    derive(&salt, password) == blake3::Hash::from(expected)
}

/// Length rule applied on registration
pub fn check_strength(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::field(
            "password",
            format!("must be at least {} characters", MIN_PASSWORD_LEN),
        ));
    }
    Ok(())
}

fn derive(salt: &[u8], password: &str) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new_derive_key(HASH_CONTEXT);
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let stored = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &stored.salt, &stored.hash));
        assert!(!verify_password("wrong horse", &stored.salt, &stored.hash));
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("same password").unwrap();
        let b = hash_password("same password").unwrap();
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn test_short_password_rejected() {
        assert_eq!(hash_password("short").unwrap_err().status_code(), 400);
    }

    #[test]
    fn test_corrupt_stored_values() {
        assert!(!verify_password("anything", "not-hex", "00"));
        assert!(!verify_password("anything", "00", "abcd"));
    }
}
