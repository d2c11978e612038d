/// Work factor for new password hashes. High enough to resist offline brute
/// force on a leaked table, low enough for interactive login.
pub const BCRYPT_COST: u32 = 10;

/// Hash a password with a fresh random salt.
pub fn hash(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, BCRYPT_COST)
}

/// Verify a password against a stored hash. Malformed hashes count as a
/// mismatch rather than an error.
pub fn verify(password: &str, password_hash: &str) -> bool {
    bcrypt::verify(password, password_hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trip() {
        let hashed = hash("secret1").unwrap();
        assert!(verify("secret1", &hashed));
        assert!(!verify("secret2", &hashed));
    }

    #[test]
    fn same_password_hashes_differently() {
        let h1 = hash("secret1").unwrap();
        let h2 = hash("secret1").unwrap();
        // Fresh salt per call
        assert_ne!(h1, h2);
    }

    #[test]
    fn malformed_hash_is_a_mismatch() {
        assert!(!verify("secret1", "not-a-bcrypt-hash"));
    }
}
