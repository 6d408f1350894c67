//! FHIRPath type names and the implicit conversion lattice.
//!
//! Every value maps to exactly one `(namespace, name)` type tag;
//! `System` types are built in, `FHIR` types come from the model
//! navigator and carry the engine's bound FHIR version. The lattice
//! Integer → Long → Decimal → Quantity and Date → DateTime drives the
//! silent promotions performed by operators and `as`.

use std::fmt;

use rust_decimal::Decimal;

use crate::quantity::Quantity;
use crate::value::Value;

/// FHIR major versions an engine can bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FhirVersion {
    R4,
    R4B,
    R5,
}

impl fmt::Display for FhirVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FhirVersion::R4 => write!(f, "R4"),
            FhirVersion::R4B => write!(f, "R4B"),
            FhirVersion::R5 => write!(f, "R5"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeNamespace {
    System,
    Fhir,
}

impl fmt::Display for TypeNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeNamespace::System => write!(f, "System"),
            TypeNamespace::Fhir => write!(f, "FHIR"),
        }
    }
}

/// A fully-qualified FHIRPath type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeName {
    pub namespace: TypeNamespace,
    pub name: String,
}

impl TypeName {
    pub fn system(name: &str) -> Self {
        Self {
            namespace: TypeNamespace::System,
            name: name.to_string(),
        }
    }

    pub fn fhir(name: &str) -> Self {
        Self {
            namespace: TypeNamespace::Fhir,
            name: name.to_string(),
        }
    }

    pub fn qualified(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }
}

const SYSTEM_TYPES: &[&str] = &[
    "Boolean", "String", "Integer", "Long", "Decimal", "Date", "DateTime", "Time", "Quantity",
];

/// FHIR primitive type codes and the System primitives they read as.
const FHIR_PRIMITIVE_ALIASES: &[(&str, &str)] = &[
    ("string", "String"),
    ("uri", "String"),
    ("url", "String"),
    ("canonical", "String"),
    ("code", "String"),
    ("id", "String"),
    ("oid", "String"),
    ("uuid", "String"),
    ("markdown", "String"),
    ("base64Binary", "String"),
    ("boolean", "Boolean"),
    ("integer", "Integer"),
    ("integer64", "Long"),
    ("positiveInt", "Integer"),
    ("unsignedInt", "Integer"),
    ("decimal", "Decimal"),
    ("date", "Date"),
    ("dateTime", "DateTime"),
    ("instant", "DateTime"),
    ("time", "Time"),
];

/// Resolve a type specifier written in an expression (`Boolean`,
/// `System.Decimal`, `FHIR.Patient`, `Patient`, `code`, …).
///
/// Unqualified names resolve to System types when they match one, to a
/// System primitive when they are a FHIR primitive alias, and to a FHIR
/// type otherwise.
pub fn resolve_specifier(specifier: &str) -> Option<TypeName> {
    if let Some(name) = specifier.strip_prefix("System.") {
        return SYSTEM_TYPES
            .iter()
            .find(|t| **t == name)
            .map(|t| TypeName::system(t));
    }
    if let Some(name) = specifier.strip_prefix("FHIR.") {
        if name.is_empty() || name.contains('.') {
            return None;
        }
        return Some(TypeName::fhir(name));
    }
    if specifier.contains('.') {
        return None;
    }
    if SYSTEM_TYPES.contains(&specifier) {
        return Some(TypeName::system(specifier));
    }
    if let Some((_, system)) = FHIR_PRIMITIVE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == specifier)
    {
        return Some(TypeName::system(system));
    }
    Some(TypeName::fhir(specifier))
}

/// The System type of a non-node value.
pub fn system_type_of(value: &Value) -> Option<TypeName> {
    let name = match value {
        Value::Boolean(_) => "Boolean",
        Value::String(_) => "String",
        Value::Integer(_) => "Integer",
        Value::Long(_) => "Long",
        Value::Decimal(_) => "Decimal",
        Value::Date(_) => "Date",
        Value::DateTime(_) => "DateTime",
        Value::Time(_) => "Time",
        Value::Quantity(_) => "Quantity",
        Value::Node(_) => return None,
    };
    Some(TypeName::system(name))
}

/// Implicitly convert a value to a System target type along the lattice
/// Integer → Long → Decimal → Quantity, Date → DateTime. Identity
/// conversions succeed; anything else is `None`.
pub fn implicit_convert(value: &Value, target: &TypeName) -> Option<Value> {
    if target.namespace != TypeNamespace::System {
        return None;
    }
    if let Some(current) = system_type_of(value) {
        if current == *target {
            return Some(value.clone());
        }
    }
    match (value, target.name.as_str()) {
        (Value::Integer(i), "Long") => Some(Value::Long(*i as i64)),
        (Value::Integer(i), "Decimal") => Some(Value::Decimal(Decimal::from(*i))),
        (Value::Integer(i), "Quantity") => {
            Some(Value::Quantity(Quantity::dimensionless(Decimal::from(*i))))
        }
        (Value::Long(l), "Decimal") => Some(Value::Decimal(Decimal::from(*l))),
        (Value::Long(l), "Quantity") => {
            Some(Value::Quantity(Quantity::dimensionless(Decimal::from(*l))))
        }
        (Value::Decimal(d), "Quantity") => Some(Value::Quantity(Quantity::dimensionless(*d))),
        (Value::Date(d), "DateTime") => Some(Value::DateTime(d.to_datetime())),
        _ => None,
    }
}
