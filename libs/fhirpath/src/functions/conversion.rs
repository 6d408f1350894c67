//! Conversion functions and their `convertsTo…` twins.
//!
//! Each `toX` yields the converted singleton or empty when the input has
//! no conversion; the `convertsToX` twin reports whether the forward leg
//! would succeed. More than one input element is a cardinality fault.

use std::str::FromStr;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use lumen_ucum::CalendarMapping;

use crate::decimal;
use crate::error::Result;
use crate::quantity::Quantity;
use crate::temporal::{Date, DateTime, DateTimePrecision, Time};
use crate::value::{Collection, Value};

static QUANTITY_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-]?\d+(?:\.\d+)?)\s*(?:'([^']+)'|([a-zA-Z]+))?$")
        .expect("quantity literal pattern is valid")
});

static INTEGER_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+$").expect("integer literal pattern is valid"));

static DECIMAL_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+(\.\d+)?$").expect("decimal literal pattern is valid"));

fn boolean_value(value: &Value) -> Option<bool> {
    match value {
        Value::Boolean(b) => Some(*b),
        Value::Integer(1) => Some(true),
        Value::Integer(0) => Some(false),
        Value::Long(1) => Some(true),
        Value::Long(0) => Some(false),
        Value::Decimal(d) if *d == Decimal::ONE => Some(true),
        Value::Decimal(d) if d.is_zero() => Some(false),
        Value::String(s) => match s.to_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" | "1.0" => Some(true),
            "false" | "f" | "no" | "n" | "0" | "0.0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn integer_value(value: &Value) -> Option<i32> {
    match value {
        Value::Integer(i) => Some(*i),
        Value::Long(l) => i32::try_from(*l).ok(),
        Value::Boolean(b) => Some(if *b { 1 } else { 0 }),
        Value::String(s) if INTEGER_LITERAL.is_match(s) => s.parse().ok(),
        _ => None,
    }
}

fn decimal_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Integer(i) => Some(Decimal::from(*i)),
        Value::Long(l) => Some(Decimal::from(*l)),
        Value::Decimal(d) => Some(*d),
        Value::Boolean(b) => Some(if *b { Decimal::ONE } else { Decimal::ZERO }),
        Value::String(s) if DECIMAL_LITERAL.is_match(s) => Decimal::from_str(s).ok(),
        _ => None,
    }
}

fn date_value(value: &Value) -> Option<Date> {
    match value {
        Value::Date(d) => Some(*d),
        // DateTime truncates to its date part; precision caps at day.
        Value::DateTime(dt) => {
            let precision = match dt.precision {
                DateTimePrecision::Year => crate::temporal::DatePrecision::Year,
                DateTimePrecision::Month => crate::temporal::DatePrecision::Month,
                _ => crate::temporal::DatePrecision::Day,
            };
            Some(Date::new(dt.local().date(), precision))
        }
        Value::String(s) => Date::parse(s),
        _ => None,
    }
}

fn datetime_value(value: &Value) -> Option<DateTime> {
    match value {
        Value::DateTime(dt) => Some(*dt),
        Value::Date(d) => Some(d.to_datetime()),
        Value::String(s) => DateTime::parse(s),
        _ => None,
    }
}

fn time_value(value: &Value) -> Option<Time> {
    match value {
        Value::Time(t) => Some(*t),
        Value::String(s) => {
            // Times are strict: the string must be a pure time literal.
            if s.contains('T') || s.contains('-') {
                return None;
            }
            Time::parse(s)
        }
        _ => None,
    }
}

fn quantity_value(value: &Value) -> Option<Quantity> {
    match value {
        Value::Quantity(q) => Some(q.clone()),
        Value::Integer(i) => Some(Quantity::dimensionless(Decimal::from(*i))),
        Value::Long(l) => Some(Quantity::dimensionless(Decimal::from(*l))),
        Value::Decimal(d) => Some(Quantity::dimensionless(*d)),
        Value::Boolean(b) => Some(Quantity::dimensionless(if *b {
            Decimal::ONE
        } else {
            Decimal::ZERO
        })),
        Value::String(s) => {
            let captures = QUANTITY_LITERAL.captures(s.trim())?;
            let value = Decimal::from_str(captures.get(1)?.as_str()).ok()?;
            if let Some(code) = captures.get(2) {
                return Some(Quantity::from_literal(value, Some(code.as_str())));
            }
            match captures.get(3) {
                Some(word) => {
                    // A bare word must be a calendar-duration keyword.
                    crate::temporal::TemporalUnit::from_calendar_word(word.as_str())?;
                    Some(Quantity::from_literal(value, Some(word.as_str())))
                }
                None => Some(Quantity::dimensionless(value)),
            }
        }
        _ => None,
    }
}

/// Render a value as its string form; `None` for values with none.
pub(crate) fn string_value(value: &Value) -> Option<Arc<str>> {
    Some(match value {
        Value::String(s) => s.clone(),
        Value::Boolean(b) => Arc::from(b.to_string().as_str()),
        Value::Integer(i) => Arc::from(i.to_string().as_str()),
        Value::Long(l) => Arc::from(l.to_string().as_str()),
        Value::Decimal(d) => Arc::from(d.to_string().as_str()),
        Value::Date(d) => Arc::from(d.format().as_str()),
        Value::DateTime(dt) => Arc::from(dt.format().as_str()),
        Value::Time(t) => Arc::from(t.format().as_str()),
        Value::Quantity(q) => Arc::from(q.to_literal().as_str()),
        Value::Node(_) => return None,
    })
}

/// Shared shape of every conversion: empty in, empty out; singleton
/// guard; converted value or empty.
fn convert<T>(
    input: &Collection,
    what: &str,
    read: impl Fn(&Value) -> Option<T>,
    wrap: impl Fn(T) -> Value,
) -> Result<Collection> {
    Ok(match input.singleton_value(what)? {
        None => Collection::empty(),
        Some(v) => match read(&v) {
            Some(out) => Collection::singleton(wrap(out)),
            None => Collection::empty(),
        },
    })
}

fn converts<T>(
    input: &Collection,
    what: &str,
    read: impl Fn(&Value) -> Option<T>,
) -> Result<Collection> {
    Ok(match input.singleton_value(what)? {
        None => Collection::empty(),
        Some(v) => Collection::singleton(Value::Boolean(read(&v).is_some())),
    })
}

pub fn to_boolean(input: Collection) -> Result<Collection> {
    convert(&input, "toBoolean()", boolean_value, Value::Boolean)
}

pub fn converts_to_boolean(input: Collection) -> Result<Collection> {
    converts(&input, "convertsToBoolean()", boolean_value)
}

pub fn to_integer(input: Collection) -> Result<Collection> {
    convert(&input, "toInteger()", integer_value, Value::Integer)
}

pub fn converts_to_integer(input: Collection) -> Result<Collection> {
    converts(&input, "convertsToInteger()", integer_value)
}

pub fn to_decimal(input: Collection) -> Result<Collection> {
    convert(&input, "toDecimal()", decimal_value, Value::Decimal)
}

pub fn converts_to_decimal(input: Collection) -> Result<Collection> {
    converts(&input, "convertsToDecimal()", decimal_value)
}

pub fn to_string(input: Collection) -> Result<Collection> {
    convert(&input, "toString()", string_value, Value::String)
}

pub fn converts_to_string(input: Collection) -> Result<Collection> {
    converts(&input, "convertsToString()", string_value)
}

pub fn to_date(input: Collection) -> Result<Collection> {
    convert(&input, "toDate()", date_value, Value::Date)
}

pub fn converts_to_date(input: Collection) -> Result<Collection> {
    converts(&input, "convertsToDate()", date_value)
}

pub fn to_datetime(input: Collection) -> Result<Collection> {
    convert(&input, "toDateTime()", datetime_value, Value::DateTime)
}

pub fn converts_to_datetime(input: Collection) -> Result<Collection> {
    converts(&input, "convertsToDateTime()", datetime_value)
}

pub fn to_time(input: Collection) -> Result<Collection> {
    convert(&input, "toTime()", time_value, Value::Time)
}

pub fn converts_to_time(input: Collection) -> Result<Collection> {
    converts(&input, "convertsToTime()", time_value)
}

fn quantity_in_unit(value: &Value, target: Option<&str>) -> Option<Quantity> {
    let q = quantity_value(value)?;
    let Some(target) = target else {
        return Some(q);
    };
    let target_q = Quantity::from_literal(Decimal::ONE, Some(target));
    if q.unit == target_q.unit {
        return Some(q);
    }
    // Convert through canonical form: same base unit, rescaled value.
    let (value_canonical, unit_canonical) = q.canonical(CalendarMapping::Equivalence)?;
    let (scalar, target_canonical) = target_q.canonical(CalendarMapping::Equivalence)?;
    if unit_canonical != target_canonical {
        return None;
    }
    let rescaled = decimal::checked_div(value_canonical, scalar)?;
    Some(Quantity::new(rescaled, target_q.unit))
}

pub fn to_quantity(input: Collection, unit: Option<&Collection>) -> Result<Collection> {
    let target = match unit {
        Some(arg) if !arg.is_empty() => Some(arg.as_string("toQuantity() unit")?),
        _ => None,
    };
    convert(
        &input,
        "toQuantity()",
        |v| quantity_in_unit(v, target.as_deref()),
        Value::Quantity,
    )
}

pub fn converts_to_quantity(input: Collection, unit: Option<&Collection>) -> Result<Collection> {
    let target = match unit {
        Some(arg) if !arg.is_empty() => Some(arg.as_string("convertsToQuantity() unit")?),
        _ => None,
    };
    converts(&input, "convertsToQuantity()", |v| {
        quantity_in_unit(v, target.as_deref())
    })
}
