//! Limit-comparison rule for configuration registers
//!
//! Inbound command values are checked against a register's configured
//! bounds before being applied. The rule is written in the document as
//! lowercase text and round-trips through `as_text`/`from_text`.

use serde::Serialize;

/// Comparison applied to an inbound value before it is accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "snake_case")]
pub enum LimitComparison {
    /// No bounds check; every value is accepted
    #[default]
    None,
    /// lower < value < upper
    Between,
    /// lower <= value <= upper
    BetweenOrEqual,
    /// value > lower
    GreaterThan,
    /// value >= lower
    GreaterThanOrEqual,
    /// value < upper
    LessThan,
    /// value <= upper
    LessThanOrEqual,
}

impl LimitComparison {
    /// Canonical text name, as written in the configuration document
    pub fn as_text(&self) -> &'static str {
        match self {
            LimitComparison::None => "none",
            LimitComparison::Between => "between",
            LimitComparison::BetweenOrEqual => "between_or_equal",
            LimitComparison::GreaterThan => "greater_than",
            LimitComparison::GreaterThanOrEqual => "greater_than_or_equal",
            LimitComparison::LessThan => "less_than",
            LimitComparison::LessThanOrEqual => "less_than_or_equal",
        }
    }

    /// Parse a rule from its text name
    ///
    /// Total: anything outside the canonical set maps to `None`, so an
    /// unreadable rule disables the bounds check instead of rejecting
    /// the register.
    pub fn from_text(text: &str) -> Self {
        match text {
            "between" => LimitComparison::Between,
            "between_or_equal" => LimitComparison::BetweenOrEqual,
            "greater_than" => LimitComparison::GreaterThan,
            "greater_than_or_equal" => LimitComparison::GreaterThanOrEqual,
            "less_than" => LimitComparison::LessThan,
            "less_than_or_equal" => LimitComparison::LessThanOrEqual,
            _ => LimitComparison::None,
        }
    }

    /// Check a candidate value against the configured bounds
    ///
    /// `Between*` use both bounds, `GreaterThan*` only the lower,
    /// `LessThan*` only the upper.
    pub fn permits(&self, value: i32, lower: i32, upper: i32) -> bool {
        match self {
            LimitComparison::None => true,
            LimitComparison::Between => lower < value && value < upper,
            LimitComparison::BetweenOrEqual => lower <= value && value <= upper,
            LimitComparison::GreaterThan => value > lower,
            LimitComparison::GreaterThanOrEqual => value >= lower,
            LimitComparison::LessThan => value < upper,
            LimitComparison::LessThanOrEqual => value <= upper,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ALL: [LimitComparison; 7] = [
        LimitComparison::None,
        LimitComparison::Between,
        LimitComparison::BetweenOrEqual,
        LimitComparison::GreaterThan,
        LimitComparison::GreaterThanOrEqual,
        LimitComparison::LessThan,
        LimitComparison::LessThanOrEqual,
    ];

    #[test]
    fn test_text_round_trip() {
        for rule in ALL {
            assert_eq!(LimitComparison::from_text(rule.as_text()), rule);
        }
    }

    #[test]
    fn test_unrecognized_text_is_none() {
        assert_eq!(LimitComparison::from_text(""), LimitComparison::None);
        assert_eq!(LimitComparison::from_text("Between"), LimitComparison::None);
        assert_eq!(
            LimitComparison::from_text("between or equal"),
            LimitComparison::None
        );
        assert_eq!(LimitComparison::from_text("=="), LimitComparison::None);
    }

    #[test]
    fn test_default_is_none() {
        assert_eq!(LimitComparison::default(), LimitComparison::None);
    }

    #[test]
    fn test_none_permits_everything() {
        let rule = LimitComparison::None;
        assert!(rule.permits(i32::MIN, 0, 10));
        assert!(rule.permits(i32::MAX, 0, 10));
    }

    #[test]
    fn test_between_is_exclusive() {
        let rule = LimitComparison::Between;
        assert!(rule.permits(5, 0, 10));
        assert!(!rule.permits(0, 0, 10));
        assert!(!rule.permits(10, 0, 10));
        assert!(!rule.permits(-1, 0, 10));
    }

    #[test]
    fn test_between_or_equal_is_inclusive() {
        let rule = LimitComparison::BetweenOrEqual;
        assert!(rule.permits(0, 0, 10));
        assert!(rule.permits(10, 0, 10));
        assert!(!rule.permits(11, 0, 10));
    }

    #[test]
    fn test_greater_than_uses_lower_bound() {
        assert!(LimitComparison::GreaterThan.permits(1, 0, 10));
        assert!(!LimitComparison::GreaterThan.permits(0, 0, 10));
        assert!(LimitComparison::GreaterThanOrEqual.permits(0, 0, 10));
        assert!(!LimitComparison::GreaterThanOrEqual.permits(-1, 0, 10));
        // Upper bound is irrelevant for these rules.
        assert!(LimitComparison::GreaterThan.permits(100, 0, 10));
    }

    #[test]
    fn test_less_than_uses_upper_bound() {
        assert!(LimitComparison::LessThan.permits(9, 0, 10));
        assert!(!LimitComparison::LessThan.permits(10, 0, 10));
        assert!(LimitComparison::LessThanOrEqual.permits(10, 0, 10));
        assert!(!LimitComparison::LessThanOrEqual.permits(11, 0, 10));
        assert!(LimitComparison::LessThan.permits(-100, 0, 10));
    }

    proptest! {
        #[test]
        fn prop_arbitrary_text_maps_to_none(text in "[a-z_ ]{0,32}") {
            prop_assume!(ALL.iter().all(|rule| rule.as_text() != text));
            prop_assert_eq!(
                LimitComparison::from_text(&text),
                LimitComparison::None
            );
        }
    }
}
