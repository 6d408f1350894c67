//! Equality (`=`) and equivalence (`~`).
//!
//! Equality returns `None` whenever comparability is undecidable —
//! mixed-precision temporals that tie on their shared fields, quantities
//! whose canonical units differ. Equivalence never returns `None`:
//! undecidable becomes false, and its item rules normalize strings,
//! round decimals to the least-precise operand, and match collections as
//! unordered multisets.

use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value as JsonValue;

use crate::value::{Collection, Value};

/// Item-level `=`. `Some(false)` for clearly different values, `None`
/// when undecidable.
pub fn values_equal(left: &Value, right: &Value) -> Option<bool> {
    use Value::*;

    match (left, right) {
        (Boolean(a), Boolean(b)) => Some(a == b),
        (String(a), String(b)) => Some(a == b),

        (Integer(_) | Long(_) | Decimal(_), Integer(_) | Long(_) | Decimal(_)) => {
            Some(as_decimal(left)? == as_decimal(right)?)
        }

        (Quantity(a), Quantity(b)) => a.eq_quantity(b),
        (Integer(_) | Long(_) | Decimal(_), Quantity(q)) => {
            crate::quantity::Quantity::dimensionless(as_decimal(left)?).eq_quantity(q)
        }
        (Quantity(q), Integer(_) | Long(_) | Decimal(_)) => {
            q.eq_quantity(&crate::quantity::Quantity::dimensionless(as_decimal(right)?))
        }

        (Date(a), Date(b)) => temporal_eq(a.partial_cmp_precision(b)),
        (DateTime(a), DateTime(b)) => temporal_eq(a.partial_cmp_precision(b)),
        (Date(a), DateTime(b)) => temporal_eq(a.to_datetime().partial_cmp_precision(b)),
        (DateTime(a), Date(b)) => temporal_eq(a.partial_cmp_precision(&b.to_datetime())),
        (Time(a), Time(b)) => temporal_eq(a.partial_cmp_precision(b)),

        (Node(a), Node(b)) => Some(a == b),
        (Node(_), _) => match left.coerced()? {
            Node(_) => Some(false),
            coerced => values_equal(&coerced, right),
        },
        (_, Node(_)) => match right.coerced()? {
            Node(_) => Some(false),
            coerced => values_equal(left, &coerced),
        },

        _ => Some(false),
    }
}

fn temporal_eq(ordering: Option<std::cmp::Ordering>) -> Option<bool> {
    ordering.map(|o| o == std::cmp::Ordering::Equal)
}

fn as_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Integer(i) => Some(Decimal::from(*i)),
        Value::Long(l) => Some(Decimal::from(*l)),
        Value::Decimal(d) => Some(*d),
        _ => None,
    }
}

/// Collection-level `=` for two non-empty operands: pairwise, any false
/// pair decides false, otherwise any undecidable pair leaves the result
/// empty ("empties are inconclusive").
pub fn collections_equal(left: &Collection, right: &Collection) -> Option<bool> {
    if left.len() != right.len() {
        return Some(false);
    }
    let mut undecided = false;
    for (l, r) in left.iter().zip(right.iter()) {
        match values_equal(l, r) {
            Some(false) => return Some(false),
            Some(true) => {}
            None => undecided = true,
        }
    }
    if undecided {
        None
    } else {
        Some(true)
    }
}

/// Membership by item equality; undecidable comparisons do not match.
pub fn contains_by_equality(collection: &Collection, value: &Value) -> bool {
    collection
        .iter()
        .any(|item| values_equal(item, value) == Some(true))
}

/// Decimal equivalence: both operands rounded to the precision of the
/// less precise one, half away from zero.
pub fn decimals_equivalent(a: &Decimal, b: &Decimal) -> bool {
    let dp = a.scale().min(b.scale());
    a.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
        == b.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Whitespace-normalized, case-insensitive string form used by `~`.
fn normalize_string(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Item-level `~`. Total: undecidable inputs are simply not equivalent.
pub fn values_equivalent(left: &Value, right: &Value) -> bool {
    use Value::*;

    match (left, right) {
        (Boolean(a), Boolean(b)) => a == b,
        (String(a), String(b)) => normalize_string(a) == normalize_string(b),

        (Integer(_) | Long(_) | Decimal(_), Integer(_) | Long(_) | Decimal(_)) => {
            match (as_decimal(left), as_decimal(right)) {
                (Some(a), Some(b)) => decimals_equivalent(&a, &b),
                _ => false,
            }
        }

        (Quantity(a), Quantity(b)) => a.equivalent_quantity(b),
        (Integer(_) | Long(_) | Decimal(_), Quantity(q)) => match as_decimal(left) {
            Some(d) => crate::quantity::Quantity::dimensionless(d).equivalent_quantity(q),
            None => false,
        },
        (Quantity(q), Integer(_) | Long(_) | Decimal(_)) => match as_decimal(right) {
            Some(d) => q.equivalent_quantity(&crate::quantity::Quantity::dimensionless(d)),
            None => false,
        },

        // Differing precisions are not equivalent.
        (Date(a), Date(b)) => {
            a.precision == b.precision
                && a.partial_cmp_precision(b) == Some(std::cmp::Ordering::Equal)
        }
        (DateTime(a), DateTime(b)) => {
            a.precision == b.precision
                && a.partial_cmp_precision(b) == Some(std::cmp::Ordering::Equal)
        }
        (Date(a), DateTime(b)) => {
            let a = a.to_datetime();
            a.precision == b.precision
                && a.partial_cmp_precision(b) == Some(std::cmp::Ordering::Equal)
        }
        (DateTime(a), Date(b)) => {
            let b = b.to_datetime();
            a.precision == b.precision
                && a.partial_cmp_precision(&b) == Some(std::cmp::Ordering::Equal)
        }
        (Time(a), Time(b)) => {
            a.precision == b.precision
                && a.partial_cmp_precision(b) == Some(std::cmp::Ordering::Equal)
        }

        (Node(a), Node(b)) => json_equivalent(a.json(), b.json()),
        (Node(_), _) => match left.coerced() {
            Some(Node(_)) | None => false,
            Some(coerced) => values_equivalent(&coerced, right),
        },
        (_, Node(_)) => match right.coerced() {
            Some(Node(_)) | None => false,
            Some(coerced) => values_equivalent(left, &coerced),
        },

        _ => false,
    }
}

/// Structural equivalence over JSON nodes with `~` semantics at leaves.
fn json_equivalent(a: &JsonValue, b: &JsonValue) -> bool {
    match (a, b) {
        (JsonValue::String(x), JsonValue::String(y)) => normalize_string(x) == normalize_string(y),
        (JsonValue::Number(x), JsonValue::Number(y)) => {
            match (
                x.to_string().parse::<Decimal>().ok(),
                y.to_string().parse::<Decimal>().ok(),
            ) {
                (Some(x), Some(y)) => decimals_equivalent(&x, &y),
                _ => false,
            }
        }
        (JsonValue::Array(xs), JsonValue::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_equivalent(x, y))
        }
        (JsonValue::Object(xs), JsonValue::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| json_equivalent(x, y)))
        }
        _ => a == b,
    }
}

/// Collection-level `~`: unordered multiset match under item equivalence.
/// Two empty collections are equivalent.
pub fn collections_equivalent(left: &Collection, right: &Collection) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut used = vec![false; right.len()];
    'outer: for l in left.iter() {
        for (i, r) in right.iter().enumerate() {
            if !used[i] && values_equivalent(l, r) {
                used[i] = true;
                continue 'outer;
            }
        }
        return false;
    }
    true
}
