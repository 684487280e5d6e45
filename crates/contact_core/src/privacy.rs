//! Pseudonymization of submitter addresses for logging
//!
//! Operators need to correlate log lines for one submission without the logs
//! carrying the raw address, so the local part is replaced by a salted hash.

use sha2::{Digest, Sha256};
use tracing::debug;

/// Number of hex characters of the hash kept in log output
const LOG_HASH_CHARS: usize = 12;

/// Salted hasher for email local parts
pub struct PrivacyProcessor {
    salt: Vec<u8>,
}

impl PrivacyProcessor {
    /// Create a processor with a fixed salt, giving stable hashes across restarts
    pub fn new(salt: Vec<u8>) -> Self {
        debug!("Privacy processor initialized with {}-byte salt", salt.len());
        Self { salt }
    }

    /// Create a processor with a per-process salt
    ///
    /// Hashes will not be consistent across restarts.
    pub fn with_random_salt() -> Self {
        use std::collections::hash_map::RandomState;
        use std::hash::{BuildHasher, Hasher};
        use std::time::SystemTime;

        let mut hasher = RandomState::new().build_hasher();
        if let Ok(elapsed) = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH) {
            hasher.write_u128(elapsed.as_nanos());
        }

        Self::new(hasher.finish().to_be_bytes().to_vec())
    }

    /// Hex-encoded SHA-256 of the salted local part
    pub fn hash_local_part(&self, local_part: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.salt);
        hasher.update(local_part.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Loggable form of `email`: shortened hash of the local part plus the domain
    ///
    /// ```rust
    /// use contact_core::privacy::PrivacyProcessor;
    ///
    /// let processor = PrivacyProcessor::new(b"salt".to_vec());
    /// let masked = processor.pseudonymize("jan@example.pl");
    /// assert!(masked.ends_with("@example.pl"));
    /// assert!(!masked.contains("jan"));
    /// ```
    pub fn pseudonymize(&self, email: &str) -> String {
        match email.rsplit_once('@') {
            Some((local_part, domain)) => {
                let hash = self.hash_local_part(local_part);
                format!("{}@{}", &hash[..LOG_HASH_CHARS], domain)
            }
            None => {
                let hash = self.hash_local_part(email);
                hash[..LOG_HASH_CHARS].to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_hash_is_stable_for_same_salt() {
        let first = PrivacyProcessor::new(b"band-salt".to_vec());
        let second = PrivacyProcessor::new(b"band-salt".to_vec());

        assert_eq!(first.hash_local_part("jan"), second.hash_local_part("jan"));
        assert_eq!(first.hash_local_part("jan").len(), 64);
    }

    #[test]
    fn test_salt_changes_hash() {
        let first = PrivacyProcessor::new(b"one".to_vec());
        let second = PrivacyProcessor::new(b"two".to_vec());

        assert_ne!(first.hash_local_part("jan"), second.hash_local_part("jan"));
    }

    #[test]
    fn test_pseudonymize_keeps_domain_only() {
        let processor = PrivacyProcessor::with_random_salt();

        let masked = processor.pseudonymize("anna.kowalska@example.pl");
        assert!(masked.ends_with("@example.pl"));
        assert!(!masked.contains("anna"));
        assert_eq!(masked.len(), LOG_HASH_CHARS + "@example.pl".len());

        let masked = processor.pseudonymize("no-at-sign");
        assert_eq!(masked.len(), LOG_HASH_CHARS);
    }
}
