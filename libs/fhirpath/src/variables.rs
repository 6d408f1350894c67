//! Environment-variable (`%name`) resolution.
//!
//! Fixed constants resolve to their terminology URLs; `vs-`/`ext-` names
//! expand to ValueSet and StructureDefinition URLs. User-supplied
//! variables take precedence; an entry that is present but null resolves
//! to the empty collection, while an absent name is a fatal unknown
//! identifier.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::value::{Collection, Value};

/// User-supplied environment variables. `None` means "defined, no value".
pub type Variables = HashMap<String, Option<Value>>;

pub fn resolve(name: &str, resource: &Collection, variables: &Variables) -> Result<Collection> {
    if let Some(entry) = variables.get(name) {
        return Ok(match entry {
            Some(value) => Collection::singleton(value.clone()),
            None => Collection::empty(),
        });
    }

    match name {
        "context" | "resource" | "rootResource" => Ok(resource.clone()),
        "sct" => Ok(url("http://snomed.info/sct")),
        "loinc" => Ok(url("http://loinc.org")),
        "ucum" => Ok(url("http://unitsofmeasure.org")),
        _ => {
            if let Some(id) = name.strip_prefix("vs-") {
                return Ok(url(&format!("http://hl7.org/fhir/ValueSet/{id}")));
            }
            if let Some(id) = name.strip_prefix("ext-") {
                return Ok(url(&format!(
                    "http://hl7.org/fhir/StructureDefinition/{id}"
                )));
            }
            Err(Error::UnknownIdentifier(format!(
                "environment variable '%{name}' is not defined"
            )))
        }
    }
}

fn url(value: &str) -> Collection {
    Collection::singleton(Value::string(value))
}
