//! Certificate fingerprints.

use crate::error::PreconditionError;
use regex::Regex;
use sha1::{Digest, Sha1};
use std::fmt;
use std::sync::LazyLock;

static THUMBPRINT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Fa-f]{40}$").expect("thumbprint regex is valid"));

/// A 40-character hexadecimal SHA-1 certificate fingerprint, stored uppercase
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Thumbprint(String);

impl Thumbprint {
    /// Validate a user-supplied thumbprint
    ///
    /// Surrounding whitespace is ignored; anything else that is not exactly 40
    /// hex digits is rejected.
    pub fn parse(input: &str) -> Result<Self, PreconditionError> {
        let trimmed = input.trim();
        if THUMBPRINT_RE.is_match(trimmed) {
            Ok(Self(trimmed.to_ascii_uppercase()))
        } else {
            Err(PreconditionError::MalformedFingerprint {
                thumbprint: input.to_string(),
            })
        }
    }

    /// Fingerprint of a DER-encoded certificate, as the Windows store computes it
    pub fn from_der(der: &[u8]) -> Self {
        let digest = Sha1::digest(der);
        Self(hex::encode_upper(digest))
    }

    /// Uppercase hex form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Thumbprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case() {
        let t = Thumbprint::parse(" a94a8fe5ccb19ba61c4c0873d391e987982fbbd3 ").expect("valid");
        assert_eq!(t.as_str(), "A94A8FE5CCB19BA61C4C0873D391E987982FBBD3");
    }

    #[test]
    fn test_parse_rejects_wrong_length_and_characters() {
        for bad in [
            "",
            "A94A8FE5CCB19BA61C4C0873D391E987982FBBD",
            "A94A8FE5CCB19BA61C4C0873D391E987982FBBD33",
            "G94A8FE5CCB19BA61C4C0873D391E987982FBBD3",
            "A9 4A8FE5CCB19BA61C4C0873D391E987982FBBD3",
        ] {
            let err = Thumbprint::parse(bad).unwrap_err();
            assert_eq!(err.exit_code(), 14, "{bad:?} should be malformed");
        }
    }

    #[test]
    fn test_from_der_is_sha1_uppercase() {
        // SHA-1("test")
        let t = Thumbprint::from_der(b"test");
        assert_eq!(t.as_str(), "A94A8FE5CCB19BA61C4C0873D391E987982FBBD3");
        assert!(Thumbprint::parse(t.as_str()).is_ok());
    }
}
