//! Unique workspace name generation

use crate::error::{Result, ScaffoldError};

/// Prefix used for generated workspace directories
pub const DEFAULT_PREFIX: &str = "test-";

/// Number of random bytes encoded into each name (16 hex characters)
const RANDOM_BYTES: usize = 8;

/// Produces `<prefix><16 lowercase hex chars>` names from OS randomness.
#[derive(Debug, Clone)]
pub struct NameGenerator {
    prefix: String,
}

impl NameGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Generate a fresh name. Fails if the entropy source is unavailable;
    /// there is no fallback to a weaker generator.
    pub fn generate(&self) -> Result<String> {
        let mut bytes = [0u8; RANDOM_BYTES];
        getrandom::getrandom(&mut bytes).map_err(|e| ScaffoldError::RandomSource(e.to_string()))?;
        Ok(format!("{}{}", self.prefix, hex::encode(bytes)))
    }
}

impl Default for NameGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn has_expected_shape(name: &str, prefix: &str) -> bool {
        match name.strip_prefix(prefix) {
            Some(suffix) => {
                suffix.len() == 16
                    && suffix
                        .chars()
                        .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
            }
            None => false,
        }
    }

    #[test]
    fn test_default_prefix_and_shape() {
        let name = NameGenerator::default().generate().unwrap();
        assert!(has_expected_shape(&name, "test-"), "bad name: {}", name);
    }

    #[test]
    fn test_custom_prefix() {
        let generator = NameGenerator::new("pack-");
        assert_eq!(generator.prefix(), "pack-");
        let name = generator.generate().unwrap();
        assert!(has_expected_shape(&name, "pack-"));
    }

    #[test]
    fn test_names_are_distinct() {
        let generator = NameGenerator::default();
        let names: HashSet<String> = (0..10_000).map(|_| generator.generate().unwrap()).collect();
        assert_eq!(names.len(), 10_000);
        assert!(names.iter().all(|n| has_expected_shape(n, DEFAULT_PREFIX)));
    }
}
