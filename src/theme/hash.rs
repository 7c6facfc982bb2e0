//! Theme fingerprints using blake3.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of hex characters kept from the blake3 digest.
const HASH_LEN: usize = 16;

/// Short hex digest of the concatenated theme blocks.
///
/// Part of every cache key, so identical class sets under a different theme
/// never share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThemeHash(String);

impl ThemeHash {
    /// Hash theme block text.
    pub fn compute(content: &str) -> Self {
        let digest = blake3::hash(content.as_bytes());
        let mut hex = hex::encode(digest.as_bytes());
        hex.truncate(HASH_LEN);
        Self(hex)
    }

    /// Accept an already computed digest (e.g. read back from the cache).
    ///
    /// Returns `None` unless the value looks like a digest produced by
    /// [`ThemeHash::compute`].
    pub fn from_hex(s: &str) -> Option<Self> {
        let valid = s.len() == HASH_LEN && s.bytes().all(|b| b.is_ascii_hexdigit());
        valid.then(|| Self(s.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThemeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_short_and_stable() {
        let a = ThemeHash::compute("--color-primary: red;");
        let b = ThemeHash::compute("--color-primary: red;");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), HASH_LEN);
    }

    #[test]
    fn test_hash_changes_with_content() {
        let a = ThemeHash::compute("--color-primary: red;");
        let b = ThemeHash::compute("--color-primary: blue;");
        assert_ne!(a, b);
    }

    #[test]
    fn test_from_hex_roundtrip() {
        let hash = ThemeHash::compute("x");
        assert_eq!(ThemeHash::from_hex(hash.as_str()), Some(hash));
        assert_eq!(ThemeHash::from_hex("not-a-hash"), None);
        assert_eq!(ThemeHash::from_hex("abc"), None);
    }
}
