//! Model navigation: property lookup, child enumeration, choice-type
//! unwrap, and type introspection over the input resource graph.
//!
//! The evaluator consumes only this interface, so it never names a
//! model-version type directly. One navigator instance is bound per FHIR
//! version; lookups are lenient — an unknown property is `None`, and the
//! three-valued logic upstream absorbs the gap.

use serde_json::Value as JsonValue;

use crate::types::{FhirVersion, TypeName};
use crate::value::{Collection, Node, Value};

pub trait ModelNavigator {
    fn version(&self) -> FhirVersion;

    fn has_property(&self, node: &Node, name: &str) -> bool;

    /// Look up a property on a node. Children of cardinality ≥ 2 expand
    /// into a multi-element collection, preserving array order. `None`
    /// means the property is absent or unknown (lenient mode).
    fn get_property(&self, node: &Node, name: &str) -> Option<Collection>;

    /// All child elements in declaration order, multi-cardinality children
    /// expanded.
    fn all_children(&self, node: &Node) -> Vec<Value>;

    /// Unwrap a choice-type holder to its underlying element. The JSON
    /// model stores choice values unwrapped (`value[x]` lives under its
    /// typed key), so the lookup in `get_property` already lands on the
    /// underlying element and this is the identity.
    fn unwrap_choice(&self, value: Value) -> Value;

    /// The FHIR type of a node, when it can be determined from the data.
    fn type_of(&self, node: &Node) -> Option<TypeName>;
}

/// JSON-backed navigator. Resource typing is data-driven via
/// `resourceType`; choice fields (`multipleBirth[x]`) are probed by
/// prefix, so accessing `multipleBirth` finds `multipleBirthBoolean` or
/// `multipleBirthInteger`, whichever the instance carries.
pub struct JsonNavigator {
    version: FhirVersion,
}

impl JsonNavigator {
    pub fn new(version: FhirVersion) -> Self {
        Self { version }
    }

    fn property_node(&self, node: &Node, name: &str) -> Option<Node> {
        let JsonValue::Object(obj) = node.json() else {
            return None;
        };
        if obj.contains_key(name) {
            return Some(node.child_key(name));
        }
        // Choice field: `name` followed by an uppercase type suffix.
        for key in obj.keys() {
            let Some(suffix) = key.strip_prefix(name) else {
                continue;
            };
            if suffix.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
                return Some(node.child_key(key));
            }
        }
        None
    }
}

/// Expand a property node: arrays flatten in order, scalars coerce to
/// System values, objects stay as nodes.
fn expand(node: Node) -> Collection {
    match node.json() {
        JsonValue::Array(items) => {
            let mut out = Collection::with_capacity(items.len());
            for (i, _) in items.iter().enumerate() {
                if let Some(v) = node.child_index(i).to_value() {
                    out.push(v);
                }
            }
            out
        }
        JsonValue::Null => Collection::empty(),
        _ => match node.to_value() {
            Some(v) => Collection::singleton(v),
            None => Collection::empty(),
        },
    }
}

impl ModelNavigator for JsonNavigator {
    fn version(&self) -> FhirVersion {
        self.version
    }

    fn has_property(&self, node: &Node, name: &str) -> bool {
        self.property_node(node, name).is_some()
    }

    fn get_property(&self, node: &Node, name: &str) -> Option<Collection> {
        let child = self.property_node(node, name)?;
        let unwrapped = match self.unwrap_choice(Value::Node(child)) {
            Value::Node(n) => n,
            other => return Some(Collection::singleton(other)),
        };
        Some(expand(unwrapped))
    }

    fn all_children(&self, node: &Node) -> Vec<Value> {
        let JsonValue::Object(obj) = node.json() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for key in obj.keys() {
            // Primitive-extension shadows and the type discriminator are
            // metadata, not children.
            if key.starts_with('_') || key == "resourceType" {
                continue;
            }
            out.extend(expand(node.child_key(key)).into_vec());
        }
        out
    }

    fn unwrap_choice(&self, value: Value) -> Value {
        value
    }

    fn type_of(&self, node: &Node) -> Option<TypeName> {
        let JsonValue::Object(obj) = node.json() else {
            return None;
        };
        let resource_type = obj.get("resourceType")?.as_str()?;
        Some(TypeName::fhir(resource_type))
    }
}
