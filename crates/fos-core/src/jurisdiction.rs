//! # Jurisdiction Types
//!
//! The country of residence recorded against each verified identity.
//! Stored as an uppercase ISO 3166-1 alpha-2 code.

use serde::{Deserialize, Serialize};

use crate::error::FosError;

/// ISO 3166-1 alpha-2 country code (e.g. `"US"`, `"CH"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

impl CountryCode {
    /// Parse a two-letter country code, normalizing to uppercase.
    pub fn parse(s: &str) -> Result<Self, FosError> {
        let trimmed = s.trim();
        if trimmed.len() != 2 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(FosError::InvalidPayload(format!(
                "country must be a two-letter ISO code, got {s:?}"
            )));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CountryCode {
    type Error = FosError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CountryCode> for String {
    fn from(value: CountryCode) -> Self {
        value.0
    }
}

impl std::fmt::Display for CountryCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_uppercased() {
        assert_eq!(CountryCode::parse("ch").unwrap().as_str(), "CH");
    }

    #[test]
    fn test_country_rejects_bad_input() {
        assert!(CountryCode::parse("USA").is_err());
        assert!(CountryCode::parse("1A").is_err());
        assert!(CountryCode::parse("").is_err());
    }
}
