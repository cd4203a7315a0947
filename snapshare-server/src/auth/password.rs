use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// bcrypt password hashing with a configurable work factor
#[derive(Clone)]
pub struct PasswordHasher {
    cost: u32,
    // Hash compared against when the login identifier matches nobody
    dummy_hash: Arc<OnceCell<String>>,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self {
            cost,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    pub fn hash(&self, password: &str) -> Result<String> {
        bcrypt::hash(password, self.cost).context("Failed to hash password")
    }

    /// Check a password against a stored hash. A corrupt hash counts as a mismatch.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        match bcrypt::verify(password, hash) {
            Ok(valid) => valid,
            Err(e) => {
                tracing::warn!("Stored password hash could not be checked: {}", e);
                false
            }
        }
    }

    /// Spend the same work as a real verification, then fail.
    pub fn verify_dummy(&self, password: &str) -> bool {
        let hash = self
            .dummy_hash
            .get_or_try_init(|| self.hash("snapshare-dummy-password"));
        if let Ok(hash) = hash {
            let _ = bcrypt::verify(password, hash);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::new(4);
        let hash = hasher.hash("hunter22").unwrap();

        assert_ne!(hash, "hunter22");
        assert!(hasher.verify("hunter22", &hash));
        assert!(!hasher.verify("hunter23", &hash));
    }

    #[test]
    fn test_corrupt_hash_never_matches() {
        let hasher = PasswordHasher::new(4);
        assert!(!hasher.verify("anything", "not-a-bcrypt-hash"));
    }

    #[test]
    fn test_dummy_verification_always_fails() {
        let hasher = PasswordHasher::new(4);
        assert!(!hasher.verify_dummy("snapshare-dummy-password"));
        assert!(!hasher.verify_dummy("other"));
    }
}
