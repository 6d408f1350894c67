//! Math functions.
//!
//! Decimal mode is 15 significant digits with half-away-from-zero
//! rounding. Integer-closed operations keep Integer inputs Integer;
//! transcendental functions compute through f64 and come back as
//! Decimal. NaN, infinities and overflow all yield the empty collection.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::decimal;
use crate::error::{Error, Result};
use crate::quantity::Quantity;
use crate::value::{Collection, Value};

enum Number {
    Integer(i32),
    Long(i64),
    Decimal(Decimal),
    Quantity(Quantity),
}

fn receiver(input: &Collection, what: &str) -> Result<Option<Number>> {
    match input.singleton_value(what)? {
        None => Ok(None),
        Some(Value::Integer(i)) => Ok(Some(Number::Integer(i))),
        Some(Value::Long(l)) => Ok(Some(Number::Long(l))),
        Some(Value::Decimal(d)) => Ok(Some(Number::Decimal(d))),
        Some(Value::Quantity(q)) => Ok(Some(Number::Quantity(q))),
        Some(other) => Err(Error::Type(format!(
            "{what} requires a numeric input, found {other:?}"
        ))),
    }
}

fn to_f64(d: Decimal) -> Option<f64> {
    d.to_f64().filter(|f| f.is_finite())
}

fn from_f64(f: f64) -> Option<Value> {
    if !f.is_finite() {
        return None;
    }
    Decimal::from_str(&f.to_string())
        .ok()
        .map(decimal::normalize)
        .map(Value::Decimal)
}

fn int_value(i: i64) -> Value {
    match i32::try_from(i) {
        Ok(i) => Value::Integer(i),
        Err(_) => Value::Long(i),
    }
}

fn singleton_or_empty(value: Option<Value>) -> Collection {
    match value {
        Some(v) => Collection::singleton(v),
        None => Collection::empty(),
    }
}

pub fn abs(input: Collection) -> Result<Collection> {
    Ok(singleton_or_empty(match receiver(&input, "abs()")? {
        None => None,
        Some(Number::Integer(i)) => i.checked_abs().map(Value::Integer),
        Some(Number::Long(l)) => l.checked_abs().map(Value::Long),
        Some(Number::Decimal(d)) => Some(Value::Decimal(d.abs())),
        Some(Number::Quantity(q)) => Some(Value::Quantity(Quantity::new(q.value.abs(), q.unit))),
    }))
}

pub fn ceiling(input: Collection) -> Result<Collection> {
    Ok(singleton_or_empty(match receiver(&input, "ceiling()")? {
        None => None,
        Some(Number::Integer(i)) => Some(Value::Integer(i)),
        Some(Number::Long(l)) => Some(Value::Long(l)),
        Some(Number::Decimal(d)) => d.ceil().to_i64().map(int_value),
        Some(Number::Quantity(_)) => {
            return Err(Error::Type("ceiling() does not apply to quantities".into()));
        }
    }))
}

pub fn floor(input: Collection) -> Result<Collection> {
    Ok(singleton_or_empty(match receiver(&input, "floor()")? {
        None => None,
        Some(Number::Integer(i)) => Some(Value::Integer(i)),
        Some(Number::Long(l)) => Some(Value::Long(l)),
        Some(Number::Decimal(d)) => d.floor().to_i64().map(int_value),
        Some(Number::Quantity(_)) => {
            return Err(Error::Type("floor() does not apply to quantities".into()));
        }
    }))
}

pub fn truncate(input: Collection) -> Result<Collection> {
    Ok(singleton_or_empty(match receiver(&input, "truncate()")? {
        None => None,
        Some(Number::Integer(i)) => Some(Value::Integer(i)),
        Some(Number::Long(l)) => Some(Value::Long(l)),
        Some(Number::Decimal(d)) => d.trunc().to_i64().map(int_value),
        Some(Number::Quantity(_)) => {
            return Err(Error::Type("truncate() does not apply to quantities".into()));
        }
    }))
}

pub fn round(input: Collection, precision: Option<&Collection>) -> Result<Collection> {
    let digits = match precision {
        Some(arg) if !arg.is_empty() => {
            let p = arg.as_integer("round() precision")?;
            if p < 0 {
                return Err(Error::Type("round() precision must be >= 0".into()));
            }
            p as u32
        }
        _ => 0,
    };
    Ok(singleton_or_empty(match receiver(&input, "round()")? {
        None => None,
        Some(Number::Integer(i)) => Some(Value::Integer(i)),
        Some(Number::Long(l)) => Some(Value::Long(l)),
        Some(Number::Decimal(d)) => Some(Value::Decimal(
            d.round_dp_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero),
        )),
        Some(Number::Quantity(_)) => {
            return Err(Error::Type("round() does not apply to quantities".into()));
        }
    }))
}

pub fn sqrt(input: Collection) -> Result<Collection> {
    Ok(singleton_or_empty(match receiver(&input, "sqrt()")? {
        None => None,
        Some(Number::Integer(i)) => sqrt_decimal(Decimal::from(i)),
        Some(Number::Long(l)) => sqrt_decimal(Decimal::from(l)),
        Some(Number::Decimal(d)) => sqrt_decimal(d),
        Some(Number::Quantity(_)) => {
            return Err(Error::Type("sqrt() does not apply to quantities".into()));
        }
    }))
}

fn sqrt_decimal(d: Decimal) -> Option<Value> {
    if d.is_sign_negative() && !d.is_zero() {
        return None;
    }
    from_f64(to_f64(d)?.sqrt())
}

pub fn ln(input: Collection) -> Result<Collection> {
    Ok(singleton_or_empty(match receiver(&input, "ln()")? {
        None => None,
        Some(Number::Integer(i)) => ln_decimal(Decimal::from(i)),
        Some(Number::Long(l)) => ln_decimal(Decimal::from(l)),
        Some(Number::Decimal(d)) => ln_decimal(d),
        Some(Number::Quantity(_)) => {
            return Err(Error::Type("ln() does not apply to quantities".into()));
        }
    }))
}

fn ln_decimal(d: Decimal) -> Option<Value> {
    let f = to_f64(d)?;
    let out = f.ln();
    from_f64(out)
}

pub fn log(input: Collection, base: &Collection) -> Result<Collection> {
    if base.is_empty() {
        return Ok(Collection::empty());
    }
    let base = match base.singleton_value("log() base")? {
        Some(Value::Integer(i)) => Decimal::from(i),
        Some(Value::Long(l)) => Decimal::from(l),
        Some(Value::Decimal(d)) => d,
        Some(other) => {
            return Err(Error::Type(format!(
                "log() base must be numeric, found {other:?}"
            )));
        }
        None => return Ok(Collection::empty()),
    };
    Ok(singleton_or_empty(match receiver(&input, "log()")? {
        None => None,
        Some(Number::Integer(i)) => log_decimal(Decimal::from(i), base),
        Some(Number::Long(l)) => log_decimal(Decimal::from(l), base),
        Some(Number::Decimal(d)) => log_decimal(d, base),
        Some(Number::Quantity(_)) => {
            return Err(Error::Type("log() does not apply to quantities".into()));
        }
    }))
}

fn log_decimal(d: Decimal, base: Decimal) -> Option<Value> {
    let out = to_f64(d)?.ln() / to_f64(base)?.ln();
    from_f64(out)
}

pub fn exp(input: Collection) -> Result<Collection> {
    Ok(singleton_or_empty(match receiver(&input, "exp()")? {
        None => None,
        Some(Number::Integer(i)) => from_f64((i as f64).exp()),
        Some(Number::Long(l)) => from_f64((l as f64).exp()),
        Some(Number::Decimal(d)) => exp_decimal(d),
        Some(Number::Quantity(_)) => {
            return Err(Error::Type("exp() does not apply to quantities".into()));
        }
    }))
}

fn exp_decimal(d: Decimal) -> Option<Value> {
    from_f64(to_f64(d)?.exp())
}

fn power_f64_opt(base: Option<f64>, exponent: Option<f64>) -> Option<Value> {
    power_f64(base?, exponent?)
}

pub fn power(input: Collection, exponent: &Collection) -> Result<Collection> {
    if exponent.is_empty() {
        return Ok(Collection::empty());
    }
    let exponent_value = exponent.singleton_value("power() exponent")?;
    Ok(singleton_or_empty(match receiver(&input, "power()")? {
        None => None,
        Some(Number::Integer(base)) => match exponent_value {
            Some(Value::Integer(e)) if e >= 0 => {
                // Integer-closed when both operands are integers.
                match u32::try_from(e).ok().and_then(|e| base.checked_pow(e)) {
                    Some(i) => Some(Value::Integer(i)),
                    None => power_f64(base as f64, e as f64),
                }
            }
            Some(Value::Integer(e)) => power_f64(base as f64, e as f64),
            Some(Value::Long(e)) => power_f64(base as f64, e as f64),
            Some(Value::Decimal(e)) => power_f64_opt(Some(base as f64), to_f64(e)),
            _ => {
                return Err(Error::Type("power() exponent must be numeric".into()));
            }
        },
        Some(Number::Long(base)) => match exponent_value {
            Some(Value::Integer(e)) => power_f64(base as f64, e as f64),
            Some(Value::Long(e)) => power_f64(base as f64, e as f64),
            Some(Value::Decimal(e)) => power_f64_opt(Some(base as f64), to_f64(e)),
            _ => {
                return Err(Error::Type("power() exponent must be numeric".into()));
            }
        },
        Some(Number::Decimal(base)) => match exponent_value {
            Some(Value::Integer(e)) => power_f64_opt(to_f64(base), Some(e as f64)),
            Some(Value::Long(e)) => power_f64_opt(to_f64(base), Some(e as f64)),
            Some(Value::Decimal(e)) => power_f64_opt(to_f64(base), to_f64(e)),
            _ => {
                return Err(Error::Type("power() exponent must be numeric".into()));
            }
        },
        Some(Number::Quantity(_)) => {
            return Err(Error::Type("power() does not apply to quantities".into()));
        }
    }))
}

/// `powf` with NaN mapped to empty (negative base with a fractional
/// exponent has no real result).
fn power_f64(base: f64, exponent: f64) -> Option<Value> {
    let out = base.powf(exponent);
    from_f64(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(i: i32) -> Collection {
        Collection::singleton(Value::Integer(i))
    }

    fn dec(s: &str) -> Collection {
        Collection::singleton(Value::Decimal(Decimal::from_str(s).unwrap()))
    }

    #[test]
    fn integer_closed_operations() {
        assert_eq!(abs(int(-5)).unwrap(), int(5));
        assert_eq!(ceiling(int(3)).unwrap(), int(3));
        assert_eq!(power(int(2), &int(10)).unwrap(), int(1024));
    }

    #[test]
    fn ceiling_floor_truncate_yield_integers() {
        assert_eq!(ceiling(dec("1.1")).unwrap(), int(2));
        assert_eq!(ceiling(dec("-1.1")).unwrap(), int(-1));
        assert_eq!(floor(dec("1.9")).unwrap(), int(1));
        assert_eq!(floor(dec("-1.1")).unwrap(), int(-2));
        assert_eq!(truncate(dec("3.7")).unwrap(), int(3));
        assert_eq!(truncate(dec("-3.7")).unwrap(), int(-3));
    }

    #[test]
    fn round_half_away_from_zero() {
        assert_eq!(round(dec("0.5"), None).unwrap(), dec("1"));
        assert_eq!(round(dec("-0.5"), None).unwrap(), dec("-1"));
        assert_eq!(round(dec("3.14159"), Some(&int(2))).unwrap(), dec("3.14"));
    }

    #[test]
    fn sqrt_of_negative_is_empty() {
        assert_eq!(sqrt(int(-1)).unwrap(), Collection::empty());
        assert_eq!(sqrt(int(4)).unwrap(), dec("2"));
    }

    #[test]
    fn ln_and_exp() {
        assert_eq!(ln(int(1)).unwrap(), dec("0"));
        // ln of a non-positive number is NaN, which is empty.
        assert_eq!(ln(int(0)).unwrap(), Collection::empty());
        assert_eq!(exp(int(0)).unwrap(), dec("1"));
    }

    #[test]
    fn log_with_base() {
        assert_eq!(log(int(8), &int(2)).unwrap(), dec("3"));
        assert_eq!(log(int(100), &int(10)).unwrap(), dec("2"));
    }

    #[test]
    fn power_edge_cases() {
        // Negative base with fractional exponent has no real result.
        assert_eq!(
            power(int(-1), &dec("0.5")).unwrap(),
            Collection::empty()
        );
        assert_eq!(power(int(2), &int(-1)).unwrap(), dec("0.5"));
    }

    #[test]
    fn quantity_abs_keeps_unit() {
        let q = Collection::singleton(Value::Quantity(Quantity::new(
            Decimal::from_str("-5.5").unwrap(),
            "'mg'",
        )));
        let Some(Value::Quantity(out)) = abs(q).unwrap().first().cloned() else {
            panic!("expected quantity");
        };
        assert_eq!(out.value, Decimal::from_str("5.5").unwrap());
        assert_eq!(out.unit, "'mg'");
    }

    #[test]
    fn empty_input_propagates() {
        assert_eq!(abs(Collection::empty()).unwrap(), Collection::empty());
        assert_eq!(
            log(Collection::empty(), &int(2)).unwrap(),
            Collection::empty()
        );
    }
}
