use bcrypt::BcryptError;

/// bcrypt password encoder shared by client secrets and user passwords.
#[derive(Debug, Clone, Copy)]
pub struct PasswordEncoder {
    cost: u32,
}

impl Default for PasswordEncoder {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordEncoder {
    #[must_use]
    pub const fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hashes `raw` with a freshly generated salt embedded in the result
    pub fn encode(&self, raw: &str) -> Result<String, BcryptError> {
        bcrypt::hash(raw, self.cost)
    }

    /// Checks `raw` against an encoded hash. Malformed hashes never match.
    #[must_use]
    pub fn matches(&self, raw: &str, encoded: &str) -> bool {
        bcrypt::verify(raw, encoded).unwrap_or(false)
    }

    /// Same as [`Self::matches`], off the async executor.
    ///
    /// bcrypt is CPU bound, so request handlers go through the blocking pool.
    pub async fn matches_blocking(&self, raw: &str, encoded: &str) -> bool {
        let encoder = *self;
        let raw = raw.to_owned();
        let encoded = encoded.to_owned();

        tokio::task::spawn_blocking(move || encoder.matches(&raw, &encoded))
            .await
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    #[test]
    fn test_password_encoding_and_matching() {
        let encoder = PasswordEncoder::new(TEST_COST);
        let encoded = encoder.encode("test_password_123").expect("Failed to hash password");

        assert!(encoded.starts_with("$2b$04$"));
        assert!(encoder.matches("test_password_123", &encoded));
        assert!(!encoder.matches("wrong_password", &encoded));
    }

    #[test]
    fn test_same_password_gets_different_salts() {
        let encoder = PasswordEncoder::new(TEST_COST);

        let first = encoder.encode("same_password").expect("Failed to hash password");
        let second = encoder.encode("same_password").expect("Failed to hash password");

        assert_ne!(first, second);
        assert!(encoder.matches("same_password", &first));
        assert!(encoder.matches("same_password", &second));
    }

    #[test]
    fn test_malformed_hash_does_not_match() {
        let encoder = PasswordEncoder::new(TEST_COST);

        assert!(!encoder.matches("squeezer", "squeezer"));
    }

    #[tokio::test]
    async fn test_blocking_match() {
        let encoder = PasswordEncoder::new(TEST_COST);
        let encoded = encoder.encode("squeezer").expect("Failed to hash password");

        assert!(encoder.matches_blocking("squeezer", &encoded).await);
        assert!(!encoder.matches_blocking("squeezed", &encoded).await);
    }
}
