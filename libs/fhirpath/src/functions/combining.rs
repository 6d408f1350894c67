//! Combining functions.

use crate::error::Result;
use crate::ops::equality::contains_by_equality;
use crate::value::Collection;

/// Merge with deduplication per FHIRPath equality (same semantics as the
/// `|` operator).
pub fn union(input: Collection, other: &Collection) -> Result<Collection> {
    let mut out = Collection::with_capacity(input.len() + other.len());
    for item in input.into_iter().chain(other.clone()) {
        if !contains_by_equality(&out, &item) {
            out.push(item);
        }
    }
    Ok(out)
}

/// Concatenate without eliminating duplicates.
pub fn combine(input: Collection, other: &Collection) -> Result<Collection> {
    let mut out = input;
    out.extend(other.clone());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn ints(values: &[i32]) -> Collection {
        Collection::from_vec(values.iter().map(|i| Value::Integer(*i)).collect())
    }

    #[test]
    fn union_deduplicates() {
        assert_eq!(union(ints(&[1, 2, 2]), &ints(&[2, 3])).unwrap(), ints(&[1, 2, 3]));
    }

    #[test]
    fn combine_concatenates() {
        assert_eq!(
            combine(ints(&[1, 2]), &ints(&[2, 3])).unwrap(),
            ints(&[1, 2, 2, 3])
        );
    }
}
