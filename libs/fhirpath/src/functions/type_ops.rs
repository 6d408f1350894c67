//! Type functions: `is`, `as`, `ofType`, `type`.
//!
//! The evaluator hands these a resolved `TypeName` since their argument
//! is a type specifier, not an evaluated expression. `as` also admits
//! the implicit conversions of the type lattice.

use std::sync::Arc;

use serde_json::json;

use crate::error::Result;
use crate::model::ModelNavigator;
use crate::types::{self, TypeName, TypeNamespace};
use crate::value::{Collection, Node, Value};

/// Does a value carry the given type?
fn matches_type(value: &Value, ty: &TypeName, navigator: &dyn ModelNavigator) -> bool {
    match ty.namespace {
        TypeNamespace::System => match value.coerced() {
            Some(coerced) => types::system_type_of(&coerced).as_ref() == Some(ty),
            None => false,
        },
        TypeNamespace::Fhir => match value {
            Value::Node(node) => navigator
                .type_of(node)
                .is_some_and(|t| t.name == ty.name),
            _ => false,
        },
    }
}

/// `ofType(T)`: collection-in filter.
pub fn of_type(
    input: Collection,
    ty: &TypeName,
    navigator: &dyn ModelNavigator,
) -> Result<Collection> {
    Ok(input
        .into_iter()
        .filter(|v| matches_type(v, ty, navigator))
        .collect())
}

/// `is T` / `is(T)`: singleton type test.
pub fn is_type(
    input: Collection,
    ty: &TypeName,
    navigator: &dyn ModelNavigator,
) -> Result<Collection> {
    let Some(value) = input.singleton_value("'is'")? else {
        return Ok(Collection::empty());
    };
    Ok(Collection::singleton(Value::Boolean(matches_type(
        &value, ty, navigator,
    ))))
}

/// `as T` / `as(T)`: the value when the type matches, including implicit
/// system-type conversion, otherwise empty.
pub fn as_type(
    input: Collection,
    ty: &TypeName,
    navigator: &dyn ModelNavigator,
) -> Result<Collection> {
    let Some(value) = input.singleton_value("'as'")? else {
        return Ok(Collection::empty());
    };
    if matches_type(&value, ty, navigator) {
        return Ok(Collection::singleton(value));
    }
    Ok(match types::implicit_convert(&value, ty) {
        Some(converted) => Collection::singleton(converted),
        None => Collection::empty(),
    })
}

/// `type()`: reflection info for each item as a `{namespace, name}` node.
pub fn type_info(input: Collection, navigator: &dyn ModelNavigator) -> Result<Collection> {
    let mut out = Collection::with_capacity(input.len());
    for item in input.iter() {
        let ty = match item {
            Value::Node(node) => navigator.type_of(node),
            other => types::system_type_of(other),
        };
        if let Some(ty) = ty {
            let doc = json!({
                "namespace": ty.namespace.to_string(),
                "name": ty.name,
            });
            out.push(Value::Node(Node::root(Arc::new(doc))));
        }
    }
    Ok(out)
}
