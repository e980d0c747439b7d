//! # Pickup Codes
//!
//! The 6-digit numeric token identifying a pending in-store-pickup
//! order. Generated uniformly over 100000–999999 (900000 values), shown
//! to the customer as a receipt, and later typed in by staff to locate
//! the order.
//!
//! Uniqueness among currently-pending orders is enforced by storage;
//! this module only owns the format and the draw. Generation takes an
//! injected `Rng` so the crate stays deterministic under test.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

/// Lowest value a pickup code can take.
pub const PICKUP_CODE_MIN: u32 = 100_000;

/// Highest value a pickup code can take.
pub const PICKUP_CODE_MAX: u32 = 999_999;

/// A 6-digit pickup code.
///
/// Stored and transferred as a string: codes are identifiers, not
/// numbers, and the first digit is never zero by construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct PickupCode(String);

impl PickupCode {
    /// Draws a fresh code, uniform over the full 900000-value space.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        PickupCode(rng.gen_range(PICKUP_CODE_MIN..=PICKUP_CODE_MAX).to_string())
    }

    /// Parses a caller-supplied code, enforcing the 6-digit format.
    pub fn parse(code: &str) -> Result<Self, ValidationError> {
        let code = code.trim();
        if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidFormat {
                field: "pickup_code".to_string(),
                reason: "must be exactly 6 digits".to_string(),
            });
        }
        match code.parse::<u32>() {
            Ok(n) if (PICKUP_CODE_MIN..=PICKUP_CODE_MAX).contains(&n) => {
                Ok(PickupCode(code.to_string()))
            }
            _ => Err(ValidationError::InvalidFormat {
                field: "pickup_code".to_string(),
                reason: "must be between 100000 and 999999".to_string(),
            }),
        }
    }

    /// Returns the code digits.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PickupCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PickupCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PickupCode::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_codes_are_six_digits() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let code = PickupCode::generate(&mut rng);
            assert_eq!(code.as_str().len(), 6);
            let n: u32 = code.as_str().parse().unwrap();
            assert!((PICKUP_CODE_MIN..=PICKUP_CODE_MAX).contains(&n));
        }
    }

    #[test]
    fn test_parse_accepts_valid_code() {
        let code = PickupCode::parse(" 123456 ").unwrap();
        assert_eq!(code.as_str(), "123456");
    }

    #[test]
    fn test_parse_rejects_bad_formats() {
        assert!(PickupCode::parse("12345").is_err()); // too short
        assert!(PickupCode::parse("1234567").is_err()); // too long
        assert!(PickupCode::parse("12a456").is_err()); // non-digit
        assert!(PickupCode::parse("012345").is_err()); // below minimum
        assert!(PickupCode::parse("").is_err());
    }

    #[test]
    fn test_roundtrips_through_from_str() {
        let code: PickupCode = "987654".parse().unwrap();
        assert_eq!(code.to_string(), "987654");
    }
}
