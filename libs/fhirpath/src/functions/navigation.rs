//! Tree navigation: `children()` and `descendants()`.

use crate::error::Result;
use crate::model::ModelNavigator;
use crate::ops::equality::contains_by_equality;
use crate::value::{Collection, Value};

/// Immediate children of every node in the input, in declaration order.
/// Primitives have no children.
pub fn children(input: Collection, navigator: &dyn ModelNavigator) -> Result<Collection> {
    let mut out = Collection::empty();
    for item in input.iter() {
        if let Value::Node(node) = item {
            for child in navigator.all_children(node) {
                out.push(child);
            }
        }
    }
    Ok(out)
}

/// All descendants: `repeat(children())`. FHIR instances are trees, but
/// visited tracking makes termination unconditional.
pub fn descendants(input: Collection, navigator: &dyn ModelNavigator) -> Result<Collection> {
    let mut out = Collection::empty();
    let mut frontier = children(input, navigator)?;
    while !frontier.is_empty() {
        let mut next = Collection::empty();
        for item in frontier {
            if contains_by_equality(&out, &item) {
                continue;
            }
            next.extend(children(
                Collection::singleton(item.clone()),
                navigator,
            )?);
            out.push(item);
        }
        frontier = next;
    }
    Ok(out)
}
