//! Utility functions: the evaluation clock, `trace`, and `not`.

use crate::context::Clock;
use crate::error::Result;
use crate::ops::boolean;
use crate::value::{Collection, Value};

/// `now()` — the timestamp captured at the start of evaluation, so every
/// occurrence in one expression sees the same instant.
pub fn now(clock: &Clock) -> Result<Collection> {
    Ok(Collection::singleton(Value::DateTime(clock.now)))
}

pub fn today(clock: &Clock) -> Result<Collection> {
    Ok(Collection::singleton(Value::Date(clock.today)))
}

pub fn time_of_day(clock: &Clock) -> Result<Collection> {
    Ok(Collection::singleton(Value::Time(clock.time_of_day)))
}

/// Log a labelled view of a collection to stderr and return the input
/// unchanged. The projected form is what gets printed when the caller
/// evaluated a projection argument.
pub fn trace(input: Collection, name: &Collection, projected: Option<&Collection>) -> Result<Collection> {
    let label = match name.singleton_value("trace() name")? {
        Some(Value::String(s)) => s.to_string(),
        _ => "trace".to_string(),
    };
    let shown = projected.unwrap_or(&input);
    eprintln!("TRACE[{label}] {} item(s): {:?}", shown.len(), shown);
    Ok(input)
}

/// Three-valued negation of a singleton boolean operand.
pub fn not(input: Collection) -> Result<Collection> {
    let operand = input.boolean_operand("not()")?;
    Ok(match boolean::not(operand) {
        Some(b) => Collection::singleton(Value::Boolean(b)),
        None => Collection::empty(),
    })
}
