//! Arithmetic operators.
//!
//! Singleton operands only; an empty operand propagates as empty before
//! these functions are reached. Mixed numeric operands promote along
//! Integer → Long → Decimal → Quantity. Overflow and division by zero
//! yield `None` (the empty collection), never an error.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::decimal;
use crate::error::{Error, Result};
use crate::quantity::Quantity;
use crate::temporal::TemporalUnit;
use crate::value::Value;

/// Operand pair after numeric promotion.
enum Promoted {
    Integer(i32, i32),
    Long(i64, i64),
    Decimal(Decimal, Decimal),
    Quantity(Quantity, Quantity),
}

fn promote(left: &Value, right: &Value) -> Option<Promoted> {
    use Value::*;
    Some(match (left, right) {
        (Integer(a), Integer(b)) => Promoted::Integer(*a, *b),
        (Integer(a), Long(b)) => Promoted::Long(*a as i64, *b),
        (Long(a), Integer(b)) => Promoted::Long(*a, *b as i64),
        (Long(a), Long(b)) => Promoted::Long(*a, *b),
        (Integer(a), Decimal(b)) => Promoted::Decimal(rust_decimal::Decimal::from(*a), *b),
        (Decimal(a), Integer(b)) => Promoted::Decimal(*a, rust_decimal::Decimal::from(*b)),
        (Long(a), Decimal(b)) => Promoted::Decimal(rust_decimal::Decimal::from(*a), *b),
        (Decimal(a), Long(b)) => Promoted::Decimal(*a, rust_decimal::Decimal::from(*b)),
        (Decimal(a), Decimal(b)) => Promoted::Decimal(*a, *b),
        (Quantity(a), Quantity(b)) => Promoted::Quantity(a.clone(), b.clone()),
        (Integer(_) | Long(_) | Decimal(_), Quantity(b)) => {
            Promoted::Quantity(crate::quantity::Quantity::dimensionless(to_decimal(left)?), b.clone())
        }
        (Quantity(a), Integer(_) | Long(_) | Decimal(_)) => {
            Promoted::Quantity(a.clone(), crate::quantity::Quantity::dimensionless(to_decimal(right)?))
        }
        _ => return None,
    })
}

fn to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Integer(i) => Some(Decimal::from(*i)),
        Value::Long(l) => Some(Decimal::from(*l)),
        Value::Decimal(d) => Some(*d),
        _ => None,
    }
}

/// The temporal unit carried by a quantity operand, or a type error for
/// units that have no calendar meaning (definite `'a'`/`'mo'` included).
fn temporal_unit(q: &Quantity) -> Result<TemporalUnit> {
    if let Some(word) = q.calendar_word() {
        if let Some(unit) = TemporalUnit::from_calendar_word(word) {
            return Ok(unit);
        }
    }
    if let Some(code) = q.ucum_code() {
        if let Some(unit) = TemporalUnit::from_ucum_code(code) {
            return Ok(unit);
        }
        if matches!(code, "a" | "mo") {
            return Err(Error::Type(format!(
                "definite duration '{code}' cannot be used in date arithmetic"
            )));
        }
    }
    Err(Error::Type(format!(
        "'{}' is not a time-valued unit",
        q.unit
    )))
}

fn temporal_add(left: &Value, q: &Quantity, negate: bool) -> Result<Option<Value>> {
    let unit = temporal_unit(q)?;
    let amount = if negate { -q.value } else { q.value };
    Ok(match left {
        Value::Date(d) => d.checked_add(&amount, unit).map(Value::Date),
        Value::DateTime(dt) => dt.checked_add(&amount, unit).map(Value::DateTime),
        Value::Time(t) => t.checked_add(&amount, unit).map(Value::Time),
        _ => None,
    })
}

pub fn add(left: &Value, right: &Value) -> Result<Option<Value>> {
    use Value::*;
    match (left, right) {
        (String(a), String(b)) => Ok(Some(Value::string(format!("{a}{b}")))),
        (Date(_) | DateTime(_) | Time(_), Quantity(q)) => temporal_add(left, q, false),
        (Quantity(_), Quantity(_)) => Err(Error::Unimplemented(
            "quantity addition is not supported".to_string(),
        )),
        _ => match promote(left, right) {
            Some(Promoted::Integer(a, b)) => Ok(a.checked_add(b).map(Value::Integer)),
            Some(Promoted::Long(a, b)) => Ok(a.checked_add(b).map(Value::Long)),
            Some(Promoted::Decimal(a, b)) => {
                Ok(a.checked_add(b).map(decimal::normalize).map(Value::Decimal))
            }
            Some(Promoted::Quantity(..)) => Err(Error::Unimplemented(
                "quantity addition is not supported".to_string(),
            )),
            None => Err(type_error("+", left, right)),
        },
    }
}

pub fn subtract(left: &Value, right: &Value) -> Result<Option<Value>> {
    use Value::*;
    match (left, right) {
        (Date(_) | DateTime(_) | Time(_), Quantity(q)) => temporal_add(left, q, true),
        (Quantity(_), Quantity(_)) => Err(Error::Unimplemented(
            "quantity subtraction is not supported".to_string(),
        )),
        _ => match promote(left, right) {
            Some(Promoted::Integer(a, b)) => Ok(a.checked_sub(b).map(Value::Integer)),
            Some(Promoted::Long(a, b)) => Ok(a.checked_sub(b).map(Value::Long)),
            Some(Promoted::Decimal(a, b)) => {
                Ok(a.checked_sub(b).map(decimal::normalize).map(Value::Decimal))
            }
            Some(Promoted::Quantity(..)) => Err(Error::Unimplemented(
                "quantity subtraction is not supported".to_string(),
            )),
            None => Err(type_error("-", left, right)),
        },
    }
}

pub fn multiply(left: &Value, right: &Value) -> Result<Option<Value>> {
    match promote(left, right) {
        Some(Promoted::Integer(a, b)) => Ok(a.checked_mul(b).map(Value::Integer)),
        Some(Promoted::Long(a, b)) => Ok(a.checked_mul(b).map(Value::Long)),
        Some(Promoted::Decimal(a, b)) => {
            Ok(a.checked_mul(b).map(decimal::normalize).map(Value::Decimal))
        }
        Some(Promoted::Quantity(a, b)) => Ok(a.checked_mul(&b).map(Value::Quantity)),
        None => Err(type_error("*", left, right)),
    }
}

/// `/` always yields Decimal for numbers; division by zero is empty.
pub fn divide(left: &Value, right: &Value) -> Result<Option<Value>> {
    match promote(left, right) {
        Some(Promoted::Integer(a, b)) => Ok(decimal::checked_div(
            Decimal::from(a),
            Decimal::from(b),
        )
        .map(Value::Decimal)),
        Some(Promoted::Long(a, b)) => Ok(decimal::checked_div(
            Decimal::from(a),
            Decimal::from(b),
        )
        .map(Value::Decimal)),
        Some(Promoted::Decimal(a, b)) => Ok(decimal::checked_div(a, b).map(Value::Decimal)),
        Some(Promoted::Quantity(a, b)) => Ok(a.checked_div(&b).map(Value::Quantity)),
        None => Err(type_error("/", left, right)),
    }
}

/// `div`: integer-truncating quotient, sign follows the dividend.
pub fn integer_div(left: &Value, right: &Value) -> Result<Option<Value>> {
    match promote(left, right) {
        Some(Promoted::Integer(a, b)) => {
            if b == 0 {
                return Ok(None);
            }
            Ok(a.checked_div(b).map(Value::Integer))
        }
        Some(Promoted::Long(a, b)) => {
            if b == 0 {
                return Ok(None);
            }
            Ok(a.checked_div(b).map(Value::Long))
        }
        Some(Promoted::Decimal(a, b)) => {
            if b.is_zero() {
                return Ok(None);
            }
            let q = a.checked_div(b).map(|d| d.trunc());
            Ok(q.and_then(|d| d.to_i64()).map(int_value))
        }
        Some(Promoted::Quantity(..)) => Err(type_error("div", left, right)),
        None => Err(type_error("div", left, right)),
    }
}

/// `mod`: remainder, sign follows the dividend.
pub fn integer_mod(left: &Value, right: &Value) -> Result<Option<Value>> {
    match promote(left, right) {
        Some(Promoted::Integer(a, b)) => {
            if b == 0 {
                return Ok(None);
            }
            Ok(a.checked_rem(b).map(Value::Integer))
        }
        Some(Promoted::Long(a, b)) => {
            if b == 0 {
                return Ok(None);
            }
            Ok(a.checked_rem(b).map(Value::Long))
        }
        Some(Promoted::Decimal(a, b)) => {
            if b.is_zero() {
                return Ok(None);
            }
            Ok(a.checked_rem(b).map(decimal::normalize).map(Value::Decimal))
        }
        Some(Promoted::Quantity(..)) => Err(type_error("mod", left, right)),
        None => Err(type_error("mod", left, right)),
    }
}

/// Unary `-` (and the no-op `+` validation).
pub fn negate(value: &Value) -> Result<Value> {
    match value {
        Value::Integer(i) => i
            .checked_neg()
            .map(Value::Integer)
            .ok_or_else(|| Error::Type("integer negation overflow".to_string())),
        Value::Long(l) => l
            .checked_neg()
            .map(Value::Long)
            .ok_or_else(|| Error::Type("long negation overflow".to_string())),
        Value::Decimal(d) => Ok(Value::Decimal(-*d)),
        Value::Quantity(q) => Ok(Value::Quantity(Quantity::new(-q.value, q.unit.clone()))),
        other => Err(Error::Type(format!(
            "unary minus requires a numeric operand, found {other:?}"
        ))),
    }
}

/// Numeric values must also pass through unary `+` untouched.
pub fn check_numeric(value: &Value) -> Result<()> {
    match value {
        Value::Integer(_) | Value::Long(_) | Value::Decimal(_) | Value::Quantity(_) => Ok(()),
        other => Err(Error::Type(format!(
            "unary plus requires a numeric operand, found {other:?}"
        ))),
    }
}

fn int_value(i: i64) -> Value {
    match i32::try_from(i) {
        Ok(i) => Value::Integer(i),
        Err(_) => Value::Long(i),
    }
}

fn type_error(op: &str, left: &Value, right: &Value) -> Error {
    Error::Type(format!(
        "operator '{op}' cannot be applied to {left:?} and {right:?}"
    ))
}
