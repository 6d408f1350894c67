//! The FHIRPath Quantity type.
//!
//! A quantity pairs an arbitrary-precision decimal with a unit string in
//! its surface form: a UCUM code in single quotes (`'kg'`, `'m/s2'`), a
//! bare calendar-duration keyword (`year`, `months`), or the sentinel
//! `'1'` for dimensionless values. Comparison and arithmetic go through
//! the UCUM engine; calendar keywords map onto definite UCUM codes, with
//! `year`/`month` admitted only under equivalence.

use rust_decimal::Decimal;

use lumen_ucum::{calendar_to_ucum, canonicalize, parse as parse_unit, CalendarMapping, Unit};

use crate::decimal;
use crate::ops::equality::decimals_equivalent;
use crate::temporal::TemporalUnit;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quantity {
    pub value: Decimal,
    pub unit: String,
}

impl Quantity {
    pub fn new(value: Decimal, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
        }
    }

    /// Build from a parsed literal: `5 'mg'`, `3 days`, or a bare number.
    pub fn from_literal(value: Decimal, unit: Option<&str>) -> Self {
        let unit = match unit {
            None => "'1'".to_string(),
            Some(word) if TemporalUnit::from_calendar_word(word).is_some() => word.to_string(),
            Some(code) => format!("'{code}'"),
        };
        Self::new(value, unit)
    }

    pub fn dimensionless(value: Decimal) -> Self {
        Self::new(value, "'1'")
    }

    /// The UCUM code when the unit is quoted (`'kg'` -> `kg`).
    pub fn ucum_code(&self) -> Option<&str> {
        self.unit
            .strip_prefix('\'')
            .and_then(|rest| rest.strip_suffix('\''))
    }

    /// The calendar keyword when the unit is a bare duration word.
    pub fn calendar_word(&self) -> Option<&str> {
        if TemporalUnit::from_calendar_word(&self.unit).is_some() {
            Some(self.unit.as_str())
        } else {
            None
        }
    }

    /// The UCUM code used for comparison under the given mapping, or `None`
    /// when the unit has no definite meaning there (e.g. `year` under
    /// equality).
    fn comparison_code(&self, mapping: CalendarMapping) -> Option<&str> {
        if let Some(word) = self.calendar_word() {
            return calendar_to_ucum(word, mapping);
        }
        self.ucum_code()
    }

    /// Canonical form: value scaled to, and unit expressed in, UCUM base
    /// units. `None` when the unit cannot be canonicalized.
    pub fn canonical(&self, mapping: CalendarMapping) -> Option<(Decimal, String)> {
        let code = self.comparison_code(mapping)?;
        let unit = parse_unit(code).ok()?;
        let canonical = canonicalize(&unit).ok()?;
        let value = self.value.checked_mul(canonical.scalar)?;
        Some((value, canonical.unit.format()))
    }

    /// Quantity equality per the equality mapping: `None` (undecidable)
    /// when the canonical units differ or cannot be computed.
    pub fn eq_quantity(&self, other: &Quantity) -> Option<bool> {
        // Identical surface units shortcut the unit engine entirely.
        if self.unit == other.unit {
            return Some(self.value == other.value);
        }
        let (lv, lu) = self.canonical(CalendarMapping::Equality)?;
        let (rv, ru) = other.canonical(CalendarMapping::Equality)?;
        if lu != ru {
            return None;
        }
        Some(lv == rv)
    }

    /// Quantity equivalence: never undecidable; incomparable units are
    /// simply not equivalent. Values compare with decimal-equivalence
    /// rounding after canonicalization.
    pub fn equivalent_quantity(&self, other: &Quantity) -> bool {
        if self.unit == other.unit {
            return decimals_equivalent(&self.value, &other.value);
        }
        let (Some((lv, lu)), Some((rv, ru))) = (
            self.canonical(CalendarMapping::Equivalence),
            other.canonical(CalendarMapping::Equivalence),
        ) else {
            return false;
        };
        lu == ru && decimals_equivalent(&lv, &rv)
    }

    /// Order two quantities; `None` when their canonical units differ.
    pub fn cmp_quantity(&self, other: &Quantity) -> Option<std::cmp::Ordering> {
        if self.unit == other.unit {
            return Some(self.value.cmp(&other.value));
        }
        let (lv, lu) = self.canonical(CalendarMapping::Equality)?;
        let (rv, ru) = other.canonical(CalendarMapping::Equality)?;
        if lu != ru {
            return None;
        }
        Some(lv.cmp(&rv))
    }

    /// The unit multiset used by arithmetic; calendar words join through
    /// their definite codes.
    fn algebra_unit(&self) -> Option<Unit> {
        let code = self.comparison_code(CalendarMapping::Equivalence)?;
        parse_unit(code).ok()
    }

    /// Multiply values and combine units by exponent addition.
    pub fn checked_mul(&self, other: &Quantity) -> Option<Quantity> {
        let value = decimal::normalize(self.value.checked_mul(other.value)?);
        let unit = self.algebra_unit()?.mul(&other.algebra_unit()?);
        Some(Quantity::new(value, render_unit(&unit)))
    }

    /// Divide values and combine units by exponent subtraction; `None` on a
    /// zero divisor.
    pub fn checked_div(&self, other: &Quantity) -> Option<Quantity> {
        let value = decimal::checked_div(self.value, other.value)?;
        let unit = self.algebra_unit()?.div(&other.algebra_unit()?);
        Some(Quantity::new(value, render_unit(&unit)))
    }

    /// Render as an expression-language literal: `7.5 'kg.m'`, `3 days`.
    pub fn to_literal(&self) -> String {
        format!("{} {}", self.value, self.unit)
    }
}

fn render_unit(unit: &Unit) -> String {
    format!("'{}'", unit.format())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn literal_surface_forms() {
        assert_eq!(Quantity::from_literal(dec("5"), Some("mg")).unit, "'mg'");
        assert_eq!(Quantity::from_literal(dec("3"), Some("days")).unit, "days");
        assert_eq!(Quantity::from_literal(dec("7"), None).unit, "'1'");
    }

    #[test]
    fn multiplication_combines_units() {
        let kg = Quantity::new(dec("2.5"), "'kg'");
        let m = Quantity::new(dec("3"), "'m'");
        let product = kg.checked_mul(&m).unwrap();
        assert_eq!(product.value, dec("7.5"));
        assert_eq!(product.unit, "'kg.m'");
    }

    #[test]
    fn division_cancels_units() {
        let distance = Quantity::new(dec("10"), "'m'");
        let time = Quantity::new(dec("4"), "'s'");
        let speed = distance.checked_div(&time).unwrap();
        assert_eq!(speed.value, dec("2.5"));
        assert_eq!(speed.unit, "'m.s-1'");

        let ratio = distance.checked_div(&distance).unwrap();
        assert_eq!(ratio.unit, "'1'");
    }

    #[test]
    fn division_by_zero_is_none() {
        let a = Quantity::new(dec("1"), "'m'");
        let zero = Quantity::new(dec("0"), "'s'");
        assert!(a.checked_div(&zero).is_none());
    }

    #[test]
    fn equality_converts_units() {
        let kg = Quantity::new(dec("1"), "'kg'");
        let g = Quantity::new(dec("1000"), "'g'");
        assert_eq!(kg.eq_quantity(&g), Some(true));

        let m = Quantity::new(dec("1"), "'m'");
        assert_eq!(kg.eq_quantity(&m), None);
    }

    #[test]
    fn calendar_words_under_equality_and_equivalence() {
        let week_word = Quantity::new(dec("1"), "week");
        let week_code = Quantity::new(dec("1"), "'wk'");
        assert_eq!(week_word.eq_quantity(&week_code), Some(true));

        // `1 year = 1 'a'` is undecidable, but equivalent.
        let year_word = Quantity::new(dec("1"), "year");
        let year_code = Quantity::new(dec("1"), "'a'");
        assert_eq!(year_word.eq_quantity(&year_code), None);
        assert!(year_word.equivalent_quantity(&year_code));
    }

    #[test]
    fn ordering_across_units() {
        let m = Quantity::new(dec("1"), "'m'");
        let cm = Quantity::new(dec("50"), "'cm'");
        assert_eq!(m.cmp_quantity(&cm), Some(std::cmp::Ordering::Greater));
    }
}
