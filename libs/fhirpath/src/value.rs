//! Runtime values and collections.
//!
//! Every FHIRPath expression yields a `Collection`: an ordered sequence
//! of `Value`s with no implicit deduplication. The empty collection is
//! the universal "no value"; singletons stand in for scalars. FHIR nodes
//! are carried by reference as a shared document root plus a key/index
//! path, so the input resource graph is borrowed, never deep-copied.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::quantity::Quantity;
use crate::temporal::{Date, DateTime, Time};

/// One step of a node path inside a JSON document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    Key(Arc<str>),
    Index(usize),
}

/// An opaque handle to an element of the input resource graph.
#[derive(Debug, Clone)]
pub struct Node {
    root: Arc<JsonValue>,
    path: Vec<PathStep>,
}

impl Node {
    pub fn root(doc: Arc<JsonValue>) -> Self {
        Self {
            root: doc,
            path: Vec::new(),
        }
    }

    pub fn child_key(&self, key: &str) -> Self {
        let mut path = self.path.clone();
        path.push(PathStep::Key(Arc::from(key)));
        Self {
            root: Arc::clone(&self.root),
            path,
        }
    }

    pub fn child_index(&self, index: usize) -> Self {
        let mut path = self.path.clone();
        path.push(PathStep::Index(index));
        Self {
            root: Arc::clone(&self.root),
            path,
        }
    }

    /// Walk the path from the document root to this node's JSON.
    pub fn json(&self) -> &JsonValue {
        static NULL: JsonValue = JsonValue::Null;
        let mut current: &JsonValue = &self.root;
        for step in &self.path {
            current = match step {
                PathStep::Key(key) => match current.get(key.as_ref()) {
                    Some(v) => v,
                    None => return &NULL,
                },
                PathStep::Index(i) => match current.get(*i) {
                    Some(v) => v,
                    None => return &NULL,
                },
            };
        }
        current
    }

    /// Convert a JSON scalar node into its System value; objects stay as
    /// nodes, nulls disappear.
    pub fn to_value(&self) -> Option<Value> {
        match self.json() {
            JsonValue::Null => None,
            JsonValue::Bool(b) => Some(Value::Boolean(*b)),
            JsonValue::String(s) => Some(Value::String(Arc::from(s.as_str()))),
            JsonValue::Number(n) => Some(number_to_value(n)),
            JsonValue::Object(_) | JsonValue::Array(_) => Some(Value::Node(self.clone())),
        }
    }

    /// A FHIR Quantity-shaped node (UCUM or unitless) read as a System
    /// Quantity, per the implicit FHIR.Quantity → System.Quantity edge.
    pub fn as_fhir_quantity(&self) -> Option<Quantity> {
        let JsonValue::Object(obj) = self.json() else {
            return None;
        };
        let value = match obj.get("value")? {
            JsonValue::Number(n) => decimal_from_number(n)?,
            _ => return None,
        };
        if let Some(system) = obj.get("system").and_then(|s| s.as_str()) {
            if system != "http://unitsofmeasure.org" {
                return None;
            }
        }
        let code = obj
            .get("code")
            .and_then(|c| c.as_str())
            .or_else(|| obj.get("unit").and_then(|u| u.as_str()));
        Some(match code {
            Some(code) => Quantity::from_literal(value, Some(code)),
            None => Quantity::dimensionless(value),
        })
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.json() == other.json()
    }
}

fn decimal_from_number(n: &serde_json::Number) -> Option<Decimal> {
    // Going through the rendered form keeps short decimals exact.
    n.to_string().parse::<Decimal>().ok()
}

fn number_to_value(n: &serde_json::Number) -> Value {
    if let Some(i) = n.as_i64() {
        return match i32::try_from(i) {
            Ok(i) => Value::Integer(i),
            Err(_) => Value::Long(i),
        };
    }
    match decimal_from_number(n) {
        Some(d) => Value::Decimal(d),
        // Out-of-range float: surface as a string rather than lie.
        None => Value::String(Arc::from(n.to_string().as_str())),
    }
}

/// A single evaluator value: a System-typed primitive or a FHIR node.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    String(Arc<str>),
    Integer(i32),
    Long(i64),
    Decimal(Decimal),
    Date(Date),
    DateTime(DateTime),
    Time(Time),
    Quantity(Quantity),
    Node(Node),
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Arc::from(s.as_ref()))
    }

    /// Collapse a node wrapping a JSON scalar into its System value;
    /// everything else passes through.
    pub fn coerced(&self) -> Option<Value> {
        match self {
            Value::Node(node) => node.to_value(),
            other => Some(other.clone()),
        }
    }

    /// The residual FHIR → System conversion applied to final results:
    /// scalar nodes become System primitives, Quantity-shaped nodes become
    /// System Quantity, complex nodes pass through.
    pub fn into_system(self) -> Option<Value> {
        match self {
            Value::Node(node) => {
                if let Some(q) = node.as_fhir_quantity() {
                    return Some(Value::Quantity(q));
                }
                node.to_value()
            }
            other => Some(other),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_ref()),
            _ => None,
        }
    }
}

/// An ordered sequence of values; the sole result type of evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection(Vec<Value>);

impl Collection {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn singleton(value: Value) -> Self {
        Self(vec![value])
    }

    pub fn from_vec(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    pub fn push(&mut self, value: Value) {
        self.0.push(value);
    }

    pub fn extend(&mut self, other: Collection) {
        self.0.extend(other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    pub fn first(&self) -> Option<&Value> {
        self.0.first()
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.0
    }

    /// The single element, if any; more than one is a cardinality fault.
    pub fn singleton_value(&self, what: &str) -> Result<Option<Value>> {
        match self.0.len() {
            0 => Ok(None),
            1 => Ok(self.0[0].coerced()),
            n => Err(Error::Cardinality(format!(
                "{what} requires a collection with at most one item, found {n}"
            ))),
        }
    }

    /// Singleton boolean operand for three-valued logic. A non-boolean
    /// singleton reads as `true` per singleton evaluation of collections.
    pub fn boolean_operand(&self, what: &str) -> Result<Option<bool>> {
        match self.singleton_value(what)? {
            None => Ok(None),
            Some(Value::Boolean(b)) => Ok(Some(b)),
            Some(_) => Ok(Some(true)),
        }
    }

    pub fn as_boolean(&self, what: &str) -> Result<bool> {
        match self.singleton_value(what)? {
            Some(Value::Boolean(b)) => Ok(b),
            Some(other) => Err(Error::Type(format!(
                "{what} expects a boolean, found {other:?}"
            ))),
            None => Err(Error::Type(format!("{what} expects a boolean, found empty"))),
        }
    }

    pub fn as_integer(&self, what: &str) -> Result<i64> {
        match self.singleton_value(what)? {
            Some(Value::Integer(i)) => Ok(i as i64),
            Some(Value::Long(l)) => Ok(l),
            Some(other) => Err(Error::Type(format!(
                "{what} expects an integer, found {other:?}"
            ))),
            None => Err(Error::Type(format!(
                "{what} expects an integer, found empty"
            ))),
        }
    }

    pub fn as_string(&self, what: &str) -> Result<Arc<str>> {
        match self.singleton_value(what)? {
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(Error::Type(format!(
                "{what} expects a string, found {other:?}"
            ))),
            None => Err(Error::Type(format!("{what} expects a string, found empty"))),
        }
    }

    /// Apply the residual FHIR → System conversion to every element.
    pub fn into_system(self) -> Collection {
        Collection(
            self.0
                .into_iter()
                .filter_map(Value::into_system)
                .collect(),
        )
    }
}

impl IntoIterator for Collection {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<Value> for Collection {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn node_paths_resolve_lazily() {
        let doc = Arc::new(json!({"name": [{"given": ["Ada", "K."]}]}));
        let root = Node::root(Arc::clone(&doc));
        let given = root
            .child_key("name")
            .child_index(0)
            .child_key("given")
            .child_index(1);
        assert_eq!(given.json(), &json!("K."));
        assert_eq!(given.to_value(), Some(Value::string("K.")));
    }

    #[test]
    fn numbers_map_to_integer_long_decimal() {
        let doc = Arc::new(json!({"a": 5, "b": 5000000000i64, "c": 1.25}));
        let root = Node::root(Arc::clone(&doc));
        assert_eq!(root.child_key("a").to_value(), Some(Value::Integer(5)));
        assert_eq!(
            root.child_key("b").to_value(),
            Some(Value::Long(5_000_000_000))
        );
        assert_eq!(
            root.child_key("c").to_value(),
            Some(Value::Decimal("1.25".parse().unwrap()))
        );
    }

    #[test]
    fn fhir_quantity_nodes_convert() {
        let doc = Arc::new(json!({
            "value": 185,
            "unit": "lbs",
            "system": "http://unitsofmeasure.org",
            "code": "[lb_av]"
        }));
        let node = Node::root(doc);
        let q = node.as_fhir_quantity().unwrap();
        assert_eq!(q.value, Decimal::from(185));
        assert_eq!(q.unit, "'[lb_av]'");
    }

    #[test]
    fn non_ucum_quantity_does_not_convert() {
        let doc = Arc::new(json!({"value": 1, "system": "http://example.org", "code": "x"}));
        assert!(Node::root(doc).as_fhir_quantity().is_none());
    }

    #[test]
    fn singleton_guard() {
        let c = Collection::from_vec(vec![Value::Integer(1), Value::Integer(2)]);
        assert!(matches!(
            c.singleton_value("test"),
            Err(Error::Cardinality(_))
        ));
        let c = Collection::singleton(Value::Integer(1));
        assert_eq!(c.as_integer("test").unwrap(), 1);
    }

    #[test]
    fn boolean_operand_singleton_semantics() {
        assert_eq!(Collection::empty().boolean_operand("t").unwrap(), None);
        assert_eq!(
            Collection::singleton(Value::Boolean(false))
                .boolean_operand("t")
                .unwrap(),
            Some(false)
        );
        // Any non-boolean singleton reads as true.
        assert_eq!(
            Collection::singleton(Value::Integer(7))
                .boolean_operand("t")
                .unwrap(),
            Some(true)
        );
    }
}
