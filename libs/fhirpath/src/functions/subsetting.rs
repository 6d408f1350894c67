//! Subsetting functions: positional slices and set-style filters.

use crate::error::{Error, Result};
use crate::ops::equality::contains_by_equality;
use crate::value::Collection;

pub fn single(input: Collection) -> Result<Collection> {
    match input.len() {
        0 => Ok(Collection::empty()),
        1 => Ok(input),
        n => Err(Error::Cardinality(format!(
            "single() expects at most one item, found {n}"
        ))),
    }
}

pub fn first(input: Collection) -> Result<Collection> {
    Ok(match input.first() {
        Some(v) => Collection::singleton(v.clone()),
        None => Collection::empty(),
    })
}

pub fn last(input: Collection) -> Result<Collection> {
    Ok(match input.iter().last() {
        Some(v) => Collection::singleton(v.clone()),
        None => Collection::empty(),
    })
}

pub fn tail(input: Collection) -> Result<Collection> {
    Ok(input.into_iter().skip(1).collect())
}

pub fn skip(input: Collection, count: &Collection) -> Result<Collection> {
    let n = count.as_integer("skip() argument")?;
    if n <= 0 {
        return Ok(input);
    }
    Ok(input.into_iter().skip(n as usize).collect())
}

pub fn take(input: Collection, count: &Collection) -> Result<Collection> {
    let n = count.as_integer("take() argument")?;
    if n <= 0 {
        return Ok(Collection::empty());
    }
    Ok(input.into_iter().take(n as usize).collect())
}

/// Items present in both operands, first-occurrence order, deduplicated.
pub fn intersect(input: Collection, other: &Collection) -> Result<Collection> {
    let mut out = Collection::empty();
    for item in input {
        if contains_by_equality(other, &item) && !contains_by_equality(&out, &item) {
            out.push(item);
        }
    }
    Ok(out)
}

/// Items not equal to anything in `other`; order and duplicates kept.
pub fn exclude(input: Collection, other: &Collection) -> Result<Collection> {
    Ok(input
        .into_iter()
        .filter(|item| !contains_by_equality(other, item))
        .collect())
}
