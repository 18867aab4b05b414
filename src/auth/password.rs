use crate::error::GantryError;
use pbkdf2::password_hash::{
    self, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use pbkdf2::{Params, Pbkdf2};
use rand::RngCore;

const SALT_LEN: usize = 16;
const OUTPUT_LEN: usize = 32;

/// PBKDF2-HMAC-SHA256 password hashing producing PHC strings
/// (`$pbkdf2-sha256$i=...,l=32$<salt>$<hash>`).
#[derive(Debug, Clone, Copy)]
pub struct PasswordKdf {
    rounds: u32,
}

impl PasswordKdf {
    pub fn new(rounds: u32) -> Self {
        Self { rounds }
    }

    pub fn hash(&self, password: &str) -> Result<String, GantryError> {
        let mut salt = [0u8; SALT_LEN];
        rand::rng().fill_bytes(&mut salt);
        let salt =
            SaltString::encode_b64(&salt).map_err(|e| GantryError::Password(e.to_string()))?;

        let params = Params {
            rounds: self.rounds,
            output_length: OUTPUT_LEN,
        };
        let hash = Pbkdf2
            .hash_password_customized(password.as_bytes(), None, None, params, &salt)
            .map_err(|e| GantryError::Password(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Constant-time check of `password` against a stored PHC string.
    ///
    /// Rounds are taken from the PHC string, so hashes made under an older
    /// `auth.password_rounds` keep verifying.
    pub fn verify(&self, password: &str, phc: &str) -> Result<bool, GantryError> {
        let parsed = PasswordHash::new(phc).map_err(|e| GantryError::Password(e.to_string()))?;
        match Pbkdf2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(GantryError::Password(e.to_string())),
        }
    }

    /// [`Self::hash`] on the blocking pool.
    pub async fn hash_blocking(self, password: String) -> Result<String, GantryError> {
        tokio::task::spawn_blocking(move || self.hash(&password))
            .await
            .map_err(|e| GantryError::UnexpectedError(format!("password hash task failed: {e}")))?
    }

    /// [`Self::verify`] on the blocking pool.
    pub async fn verify_blocking(self, password: String, phc: String) -> Result<bool, GantryError> {
        tokio::task::spawn_blocking(move || self.verify(&password, &phc))
            .await
            .map_err(|e| GantryError::UnexpectedError(format!("password verify task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_ROUNDS: u32 = 2_048;

    #[test]
    fn hash_then_verify() {
        let kdf = PasswordKdf::new(TEST_ROUNDS);
        let phc = kdf.hash("s3cret").expect("hash");

        assert!(phc.starts_with("$pbkdf2-sha256$"));
        assert!(!phc.contains("s3cret"));
        assert!(kdf.verify("s3cret", &phc).expect("verify"));
        assert!(!kdf.verify("wrong", &phc).expect("verify"));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let kdf = PasswordKdf::new(TEST_ROUNDS);
        let a = kdf.hash("s3cret").expect("hash");
        let b = kdf.hash("s3cret").expect("hash");
        assert_ne!(a, b);
    }

    #[test]
    fn verify_honours_rounds_in_stored_hash() {
        let old = PasswordKdf::new(TEST_ROUNDS).hash("s3cret").expect("hash");
        let current = PasswordKdf::new(TEST_ROUNDS * 2);
        assert!(current.verify("s3cret", &old).expect("verify"));
    }

    #[test]
    fn garbage_hash_is_an_error_not_a_mismatch() {
        let kdf = PasswordKdf::new(TEST_ROUNDS);
        assert!(matches!(
            kdf.verify("s3cret", "not-a-phc-string"),
            Err(GantryError::Password(_))
        ));
    }
}
