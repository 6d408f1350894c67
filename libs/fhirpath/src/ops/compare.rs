//! Ordering comparison (`<`, `<=`, `>`, `>=`).
//!
//! Operands must be the same kind after implicit conversion; mixing
//! kinds is a type error. Undecidable orderings — temporal precision or
//! zone mismatch, quantities with different canonical units — yield
//! `None`, which the evaluator maps to the empty collection.

use std::cmp::Ordering;

use rust_decimal::Decimal;

use crate::ast::CmpOp;
use crate::error::{Error, Result};
use crate::value::Value;

pub fn compare_values(left: &Value, right: &Value) -> Result<Option<Ordering>> {
    use Value::*;

    match (left, right) {
        (String(a), String(b)) => Ok(Some(a.as_ref().cmp(b.as_ref()))),

        (Integer(_) | Long(_) | Decimal(_), Integer(_) | Long(_) | Decimal(_)) => {
            let a = numeric(left);
            let b = numeric(right);
            match (a, b) {
                (Some(a), Some(b)) => Ok(Some(a.cmp(&b))),
                _ => Ok(None),
            }
        }

        (Quantity(a), Quantity(b)) => Ok(a.cmp_quantity(b)),
        (Integer(_) | Long(_) | Decimal(_), Quantity(q)) => match numeric(left) {
            Some(d) => Ok(crate::quantity::Quantity::dimensionless(d).cmp_quantity(q)),
            None => Ok(None),
        },
        (Quantity(q), Integer(_) | Long(_) | Decimal(_)) => match numeric(right) {
            Some(d) => Ok(q.cmp_quantity(&crate::quantity::Quantity::dimensionless(d))),
            None => Ok(None),
        },

        (Date(a), Date(b)) => Ok(a.cmp_same_precision(b)),
        (DateTime(a), DateTime(b)) => Ok(a.cmp_same_precision(b)),
        (Date(a), DateTime(b)) => Ok(a.to_datetime().cmp_same_precision(b)),
        (DateTime(a), Date(b)) => Ok(a.cmp_same_precision(&b.to_datetime())),
        (Time(a), Time(b)) => Ok(a.cmp_same_precision(b)),

        (Node(_), _) => match left.coerced() {
            Some(Node(_)) | None => Err(incomparable(left, right)),
            Some(coerced) => compare_values(&coerced, right),
        },
        (_, Node(_)) => match right.coerced() {
            Some(Node(_)) | None => Err(incomparable(left, right)),
            Some(coerced) => compare_values(left, &coerced),
        },

        _ => Err(incomparable(left, right)),
    }
}

fn incomparable(left: &Value, right: &Value) -> Error {
    Error::Type(format!(
        "cannot order {} against {}",
        kind_name(left),
        kind_name(right)
    ))
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Boolean(_) => "Boolean",
        Value::String(_) => "String",
        Value::Integer(_) => "Integer",
        Value::Long(_) => "Long",
        Value::Decimal(_) => "Decimal",
        Value::Date(_) => "Date",
        Value::DateTime(_) => "DateTime",
        Value::Time(_) => "Time",
        Value::Quantity(_) => "Quantity",
        Value::Node(_) => "Node",
    }
}

fn numeric(value: &Value) -> Option<Decimal> {
    match value {
        Value::Integer(i) => Some(Decimal::from(*i)),
        Value::Long(l) => Some(Decimal::from(*l)),
        Value::Decimal(d) => Some(*d),
        _ => None,
    }
}

/// Apply a comparison operator to an ordering.
pub fn apply(op: CmpOp, ordering: Ordering) -> bool {
    match op {
        CmpOp::Lt => ordering == Ordering::Less,
        CmpOp::Lte => ordering != Ordering::Greater,
        CmpOp::Gt => ordering == Ordering::Greater,
        CmpOp::Gte => ordering != Ordering::Less,
    }
}
