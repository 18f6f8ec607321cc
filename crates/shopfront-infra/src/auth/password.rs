//! Password hashing for shopper and admin accounts.
//!
//! Hashes are Argon2id PHC strings (`$argon2id$v=19$m=...`), so the
//! parameters travel with each hash and old hashes keep verifying after the
//! defaults change.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use shopfront_core::ports::{AuthError, PasswordService};

pub struct Argon2PasswordService {
    hasher: Argon2<'static>,
}

impl Argon2PasswordService {
    pub fn new() -> Self {
        Self {
            hasher: Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default()),
        }
    }
}

impl Default for Argon2PasswordService {
    fn default() -> Self {
        Self::new()
    }
}

fn hashing_error(err: argon2::password_hash::Error) -> AuthError {
    AuthError::HashingError(err.to_string())
}

impl PasswordService for Argon2PasswordService {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .hasher
            .hash_password(password.as_bytes(), &salt)
            .map_err(hashing_error)?;
        Ok(hash.to_string())
    }

    /// `Ok(false)` for a wrong password; `Err` only when the stored hash is
    /// not a PHC string.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let stored = PasswordHash::new(hash).map_err(hashing_error)?;

        match self.hasher.verify_password(password.as_bytes(), &stored) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(hashing_error(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_password_verifies() {
        let passwords = Argon2PasswordService::new();
        let stored = passwords.hash("correct-horse").unwrap();

        assert!(stored.starts_with("$argon2id$"));
        assert!(passwords.verify("correct-horse", &stored).unwrap());
        assert!(!passwords.verify("Correct-horse", &stored).unwrap());
    }

    #[test]
    fn test_each_hash_is_salted() {
        let passwords = Argon2PasswordService::new();
        assert_ne!(
            passwords.hash("hunter22").unwrap(),
            passwords.hash("hunter22").unwrap()
        );
    }

    #[test]
    fn test_corrupt_stored_hash_is_an_error() {
        let passwords = Argon2PasswordService::new();
        assert!(matches!(
            passwords.verify("hunter22", "plaintext-from-an-old-import"),
            Err(AuthError::HashingError(_))
        ));
    }
}
