//! Existence and collection-query functions.

use crate::error::{Error, Result};
use crate::ops::equality::{contains_by_equality, values_equal};
use crate::value::{Collection, Value};

pub fn empty(input: Collection) -> Result<Collection> {
    Ok(Collection::singleton(Value::Boolean(input.is_empty())))
}

pub fn exists(input: Collection) -> Result<Collection> {
    Ok(Collection::singleton(Value::Boolean(!input.is_empty())))
}

fn all_booleans(input: &Collection, what: &str) -> Result<Vec<bool>> {
    input
        .iter()
        .map(|item| match item.coerced() {
            Some(Value::Boolean(b)) => Ok(b),
            _ => Err(Error::Type(format!(
                "{what} requires a collection of booleans"
            ))),
        })
        .collect()
}

pub fn all_true(input: Collection) -> Result<Collection> {
    let bools = all_booleans(&input, "allTrue()")?;
    Ok(Collection::singleton(Value::Boolean(
        bools.iter().all(|b| *b),
    )))
}

pub fn any_true(input: Collection) -> Result<Collection> {
    let bools = all_booleans(&input, "anyTrue()")?;
    Ok(Collection::singleton(Value::Boolean(
        bools.iter().any(|b| *b),
    )))
}

pub fn all_false(input: Collection) -> Result<Collection> {
    let bools = all_booleans(&input, "allFalse()")?;
    Ok(Collection::singleton(Value::Boolean(
        bools.iter().all(|b| !*b),
    )))
}

pub fn any_false(input: Collection) -> Result<Collection> {
    let bools = all_booleans(&input, "anyFalse()")?;
    Ok(Collection::singleton(Value::Boolean(
        bools.iter().any(|b| !*b),
    )))
}

pub fn subset_of(input: Collection, other: &Collection) -> Result<Collection> {
    let is_subset = input
        .iter()
        .all(|item| contains_by_equality(other, item));
    Ok(Collection::singleton(Value::Boolean(is_subset)))
}

pub fn superset_of(input: Collection, other: &Collection) -> Result<Collection> {
    let is_superset = other
        .iter()
        .all(|item| contains_by_equality(&input, item));
    Ok(Collection::singleton(Value::Boolean(is_superset)))
}

pub fn count(input: Collection) -> Result<Collection> {
    let n = i32::try_from(input.len())
        .map_err(|_| Error::Type("collection too large to count".to_string()))?;
    Ok(Collection::singleton(Value::Integer(n)))
}

/// Deduplicate by FHIRPath equality, keeping first occurrences.
/// Undecidable comparisons never merge items.
pub fn distinct(input: Collection) -> Result<Collection> {
    let mut out = Collection::with_capacity(input.len());
    for item in input {
        if !contains_by_equality(&out, &item) {
            out.push(item);
        }
    }
    Ok(out)
}

pub fn is_distinct(input: Collection) -> Result<Collection> {
    for (i, a) in input.iter().enumerate() {
        for b in input.iter().skip(i + 1) {
            if values_equal(a, b) == Some(true) {
                return Ok(Collection::singleton(Value::Boolean(false)));
            }
        }
    }
    Ok(Collection::singleton(Value::Boolean(true)))
}
