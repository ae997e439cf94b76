//! Randomized config script filename
//!
//! Names look like `042.k3j9x0ab.js`: a zero-padded number below 1000, eight
//! characters from `[a-z0-9]`, then `.js`. The random part defeats caching of
//! a previous build's config.

use std::fmt;
use std::sync::OnceLock;

use rand::Rng;
use regex_lite::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::patterns;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const SUFFIX_LEN: usize = 8;

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    patterns::literal(&PATTERN, patterns::FILENAME)
}

/// Validated output filename
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputFilename(String);

impl OutputFilename {
    /// Generate a fresh name from `rng`.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let number: u16 = rng.gen_range(0..1000);
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();
        Self(format!("{:03}.{}.js", number, suffix))
    }

    /// Generate with the thread-local RNG.
    pub fn random() -> Self {
        Self::generate(&mut rand::thread_rng())
    }

    /// Parse an existing name, rejecting anything off-pattern.
    pub fn parse(name: &str) -> Result<Self, FilenameError> {
        if Self::is_match(name) {
            Ok(Self(name.to_string()))
        } else {
            Err(FilenameError(name.to_string()))
        }
    }

    pub fn is_match(name: &str) -> bool {
        pattern().is_match(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OutputFilename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for OutputFilename {
    type Err = FilenameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for OutputFilename {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for OutputFilename {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Name does not match `NNN.xxxxxxxx.js`
#[derive(Debug, thiserror::Error)]
#[error("invalid config script filename '{0}' (expected NNN.xxxxxxxx.js)")]
pub struct FilenameError(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_names_match_pattern() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let name = OutputFilename::generate(&mut rng);
            assert!(OutputFilename::is_match(name.as_str()), "{}", name);
            assert_eq!(name.as_str().len(), 15);
        }
    }

    #[test]
    fn test_seeded_generation_is_deterministic() {
        let a = OutputFilename::generate(&mut StdRng::seed_from_u64(42));
        let b = OutputFilename::generate(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse() {
        assert!(OutputFilename::parse("007.abc123xy.js").is_ok());
        assert!(OutputFilename::parse("7.abc123xy.js").is_err());
        assert!(OutputFilename::parse("007.ABC123XY.js").is_err());
        assert!(OutputFilename::parse("007.abc123x.js").is_err());
        assert!(OutputFilename::parse("007.abc123xy.js.map").is_err());
        assert!(OutputFilename::parse("app.3f2a1b.js").is_err());
    }

    #[test]
    fn test_serde_validates() {
        let name: OutputFilename = serde_json::from_str("\"123.zzzzzzzz.js\"").unwrap();
        assert_eq!(name.to_string(), "123.zzzzzzzz.js");
        assert!(serde_json::from_str::<OutputFilename>("\"index.html\"").is_err());
    }
}
