//! Pincode (Indian postal code) value type

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

static PINCODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{6}$").expect("pincode pattern compiles"));

/// A validated 6-digit postal code.
///
/// Pincodes are the only geographic partition key of the marketplace: listings,
/// carts and orders are matched by exact equality, never by prefix or proximity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "500001")]
pub struct Pincode(String);

impl Pincode {
    /// Parse a raw user submission. No trimming is applied.
    pub fn parse(raw: &str) -> AppResult<Self> {
        if PINCODE_RE.is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(AppError::InvalidPincodeFormat(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Pincode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Pincode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Pincode {
    type Error = AppError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Pincode> for String {
    fn from(p: Pincode) -> Self {
        p.0
    }
}

/// Parse an optional stored pincode, dropping values that fail validation.
///
/// Stored documents may predate validation; an unparseable value is treated the
/// same as a missing one so the listing or cart line becomes non-orderable.
pub fn parse_stored(raw: Option<String>) -> Option<Pincode> {
    raw.and_then(|s| Pincode::parse(&s).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_exactly_six_digits() {
        assert!(Pincode::parse("500001").is_ok());
        assert!(Pincode::parse("000000").is_ok());
    }

    #[test]
    fn rejects_everything_else() {
        for raw in ["", "50001", "5000011", "50000a", " 500001", "500001 ", "५००००१", "50-001"] {
            match Pincode::parse(raw) {
                Err(AppError::InvalidPincodeFormat(v)) => assert_eq!(v, raw),
                other => panic!("expected InvalidPincodeFormat for {raw:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn deserialization_validates() {
        let ok: Result<Pincode, _> = serde_json::from_str("\"560034\"");
        assert!(ok.is_ok());
        let bad: Result<Pincode, _> = serde_json::from_str("\"5600\"");
        assert!(bad.is_err());
    }

    #[test]
    fn stored_values_degrade_to_absent() {
        assert_eq!(parse_stored(Some("12".into())), None);
        assert_eq!(parse_stored(None), None);
        assert_eq!(
            parse_stored(Some("110001".into())).map(String::from),
            Some("110001".to_string())
        );
    }
}
