//! Static UCUM definition tables.
//!
//! Each supported symbol maps to its base-unit expansion and scale factor;
//! base units map to themselves. The table is process-wide immutable and
//! built once on first use. Affine units (degree Celsius/Fahrenheit) are
//! intentionally absent: they have no linear base-unit expansion.

use std::collections::HashMap;
use std::str::FromStr;

use once_cell::sync::Lazy;
use rust_decimal::Decimal;

pub(crate) struct UnitDef {
    /// `None` for base units; otherwise `(expansion expression, factor)`.
    pub expansion: Option<(&'static str, Decimal)>,
    /// Metric units accept SI prefixes.
    pub metric: bool,
}

/// `(symbol, expansion expression, factor, metric)`; empty expression marks a base unit.
const DEFINITIONS: &[(&str, &str, &str, bool)] = &[
    // UCUM base units.
    ("m", "", "1", true),
    ("g", "", "1", true),
    ("s", "", "1", true),
    ("rad", "", "1", true),
    ("K", "", "1", true),
    ("C", "", "1", true),
    ("cd", "", "1", true),
    ("mol", "", "1", true),
    // Definite-duration time units.
    ("min", "s", "60", false),
    ("h", "min", "60", false),
    ("d", "h", "24", false),
    ("wk", "d", "7", false),
    ("a", "d", "365.25", false),
    ("mo", "d", "30.4375", false),
    // Named SI derived units.
    ("Hz", "s-1", "1", true),
    ("N", "kg.m/s2", "1", true),
    ("Pa", "N/m2", "1", true),
    ("J", "N.m", "1", true),
    ("W", "J/s", "1", true),
    ("A", "C/s", "1", true),
    ("V", "J/C", "1", true),
    ("Ohm", "V/A", "1", true),
    ("L", "dm3", "1", true),
    ("l", "dm3", "1", true),
    ("kat", "mol/s", "1", true),
    // Dimensionless and clinical units.
    ("%", "1", "0.01", false),
    ("eq", "mol", "1", true),
    ("osm", "mol", "1", true),
    ("U", "umol/min", "1", true),
    ("bar", "Pa", "100000", true),
    ("atm", "Pa", "101325", false),
    ("m[Hg]", "Pa", "133322.387415", true),
    ("[in_i]", "cm", "2.54", false),
    ("[ft_i]", "[in_i]", "12", false),
    ("[lb_av]", "g", "453.59237", false),
    ("[oz_av]", "[lb_av]", "0.0625", false),
];

/// SI prefixes as powers of ten. Two-character prefixes come first so that
/// prefix stripping prefers `da` over `d`.
const PREFIXES: &[(&str, i32)] = &[
    ("da", 1),
    ("Y", 24),
    ("Z", 21),
    ("E", 18),
    ("P", 15),
    ("T", 12),
    ("G", 9),
    ("M", 6),
    ("k", 3),
    ("h", 2),
    ("d", -1),
    ("c", -2),
    ("m", -3),
    ("u", -6),
    ("n", -9),
    ("p", -12),
    ("f", -15),
    ("a", -18),
    ("z", -21),
    ("y", -24),
];

static UNITS: Lazy<HashMap<&'static str, UnitDef>> = Lazy::new(|| {
    DEFINITIONS
        .iter()
        .map(|(symbol, expression, factor, metric)| {
            let expansion = if expression.is_empty() {
                None
            } else {
                let factor =
                    Decimal::from_str(factor).expect("unit table factor is a valid decimal");
                Some((*expression, factor))
            };
            (
                *symbol,
                UnitDef {
                    expansion,
                    metric: *metric,
                },
            )
        })
        .collect()
});

pub(crate) fn lookup(symbol: &str) -> Option<&'static UnitDef> {
    UNITS.get(symbol)
}

pub(crate) fn prefixes() -> &'static [(&'static str, i32)] {
    PREFIXES
}

/// Which calendar-duration keywords a mapping admits.
///
/// Under FHIRPath equality, `year` and `month` have calendar semantics that
/// definite UCUM durations cannot reproduce, so the `Equality` mapping
/// excludes them; equivalence tolerates the approximation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarMapping {
    Equality,
    Equivalence,
}

/// Map a FHIRPath calendar-duration keyword (singular or plural) to the
/// definite UCUM code used for comparison. Returns `None` for words outside
/// the chosen mapping.
pub fn calendar_to_ucum(word: &str, mapping: CalendarMapping) -> Option<&'static str> {
    let code = match word {
        "week" | "weeks" => "wk",
        "day" | "days" => "d",
        "hour" | "hours" => "h",
        "minute" | "minutes" => "min",
        "second" | "seconds" => "s",
        "millisecond" | "milliseconds" => "ms",
        "year" | "years" => "a",
        "month" | "months" => "mo",
        _ => return None,
    };
    if matches!(code, "a" | "mo") && mapping == CalendarMapping::Equality {
        return None;
    }
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_units_have_no_expansion() {
        for symbol in ["m", "g", "s", "K", "mol"] {
            assert!(lookup(symbol).unwrap().expansion.is_none());
        }
    }

    #[test]
    fn calendar_mapping_excludes_year_month_for_equality() {
        assert_eq!(
            calendar_to_ucum("week", CalendarMapping::Equality),
            Some("wk")
        );
        assert_eq!(calendar_to_ucum("year", CalendarMapping::Equality), None);
        assert_eq!(
            calendar_to_ucum("year", CalendarMapping::Equivalence),
            Some("a")
        );
        assert_eq!(
            calendar_to_ucum("months", CalendarMapping::Equivalence),
            Some("mo")
        );
        assert_eq!(calendar_to_ucum("fortnight", CalendarMapping::Equality), None);
    }
}
