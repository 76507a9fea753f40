//! Whole-number percentages used for accuracy, completion and creation progress.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Percentage(u8);

impl Percentage {
    pub const ZERO: Self = Self(0);
    const MAX: u8 = 100;

    /// Saturates at 100.
    pub fn new(value: u8) -> Self {
        Self(value.min(Self::MAX))
    }

    /// Refuses anything above 100 instead of saturating.
    pub fn try_new(value: u8) -> Result<Self, ValidationError> {
        if value > Self::MAX {
            return Err(ValidationError::out_of_range(
                "percentage",
                0,
                i32::from(Self::MAX),
                i32::from(value),
            ));
        }
        Ok(Self(value))
    }

    /// `part / whole` rounded to the nearest point. An empty whole yields zero.
    pub fn from_ratio(part: u32, whole: u32) -> Self {
        if whole == 0 {
            return Self::ZERO;
        }
        let clamped = part.min(whole);
        let rounded = (f64::from(clamped) * 100.0 / f64::from(whole)).round();
        Self(rounded as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Percentage {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<Percentage> for u8 {
    fn from(p: Percentage) -> Self {
        p.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturating_constructor_caps_at_one_hundred() {
        assert_eq!(Percentage::new(140).value(), 100);
        assert_eq!(Percentage::new(42).value(), 42);
    }

    #[test]
    fn strict_constructor_reports_the_offending_value() {
        let err = Percentage::try_new(101).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::OutOfRange { field: "percentage", actual: 101, .. }
        ));
    }

    #[test]
    fn ratio_rounds_to_nearest_point() {
        assert_eq!(Percentage::from_ratio(1, 3).value(), 33);
        assert_eq!(Percentage::from_ratio(2, 3).value(), 67);
        assert_eq!(Percentage::from_ratio(7, 7).value(), 100);
        assert_eq!(Percentage::from_ratio(0, 0), Percentage::ZERO);
    }

    #[test]
    fn deserializing_rejects_values_above_one_hundred() {
        assert!(serde_json::from_str::<Percentage>("100").is_ok());
        assert!(serde_json::from_str::<Percentage>("180").is_err());
    }
}
