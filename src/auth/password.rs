use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::config;
use crate::error::ApiError;

use super::AuthError;

/// Hash a password with Argon2id and a fresh random salt.
/// The result is a self-describing PHC string, safe to store as-is.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Verify a candidate password against a stored PHC hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Registration/update password policy: minimum length from config
pub fn validate_password(password: &str) -> Result<(), ApiError> {
    let min = config::config().security.min_password_length;
    if password.chars().count() < min {
        return Err(ApiError::field_error(
            "password",
            format!("Ensure this field has at least {} characters.", min),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("grenache").unwrap();
        assert_ne!(hash, "grenache");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("grenache", &hash));
        assert!(!verify_password("merlot", &hash));
    }

    #[test]
    fn verify_handles_garbage_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn short_passwords_rejected() {
        assert!(validate_password("abcd").is_err());
        assert!(validate_password("abcde").is_ok());
    }
}
