//! Answer normalization and salted digests.
//!
//! Reference answers are never stored in clear text: the validator holds
//! `digest(salt, answer)` and compares digests. Normalization runs on both
//! sides so that casing and stray whitespace never fail a correct player.

/// Canonical form of a submitted answer: trimmed, lower-cased, and with all
/// internal whitespace removed ("Pamuk kale" and "pamukkale" are the same
/// answer).
pub fn normalize(answer: &str) -> String {
    answer
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Salted digest of a normalized answer.
pub fn digest(salt: &str, answer: &str) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(salt.as_bytes());
    hasher.update(normalize(answer).as_bytes());
    *hasher.finalize().as_bytes()
}

/// Checks a submission against a stored reference digest.
pub fn verify(salt: &str, answer: &str, expected: &[u8; 32]) -> bool {
    digest(salt, answer) == *expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_lowercases_and_strips_whitespace() {
        assert_eq!(normalize("Istanbul "), "istanbul");
        assert_eq!(normalize("  CAPPADOCIA"), "cappadocia");
        assert_eq!(normalize("Pamuk kale"), "pamukkale");
        assert_eq!(normalize("ephesus"), "ephesus");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn digest_is_normalization_insensitive() {
        let salt = "contest-salt";
        let reference = digest(salt, "istanbul");
        assert!(verify(salt, "Istanbul ", &reference));
        assert!(verify(salt, " ISTANBUL", &reference));
        assert!(!verify(salt, "ankara", &reference));
    }

    #[test]
    fn digest_depends_on_salt() {
        assert_ne!(digest("a", "istanbul"), digest("b", "istanbul"));
    }
}
