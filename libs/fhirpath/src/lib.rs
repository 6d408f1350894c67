//! FHIRPath expression engine.
//!
//! Evaluates FHIRPath expressions over FHIR resource graphs: parse to an
//! AST, walk the tree against a version-bound model navigator, and
//! produce a collection of values. Scalars are singleton collections;
//! "no result" is the empty collection.
//!
//! ```text
//! Expression String
//!      |
//!   Lexer/Parser -> AST
//!      |
//!   Evaluator (model navigator, operator + function libraries)
//!      |
//!   Collection<Value>
//! ```
//!
//! # Example
//!
//! ```
//! use lumen_fhirpath::{evaluate, Variables};
//! use serde_json::json;
//!
//! let patient = json!({
//!     "resourceType": "Patient",
//!     "name": [{"given": ["Ada", "K."]}]
//! });
//! let result = evaluate("Patient.name.given", Some(&patient), &Variables::new()).unwrap();
//! assert_eq!(result.len(), 2);
//! ```

pub mod ast;
pub mod context;
mod decimal;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod model;
pub mod ops;
pub mod parser;
pub mod quantity;
mod registry;
pub mod temporal;
pub mod token;
pub mod types;
pub mod value;
pub mod variables;

pub use engine::{evaluate, Engine};
pub use error::{Error, Result};
pub use quantity::Quantity;
pub use types::FhirVersion;
pub use value::{Collection, Value};
pub use variables::Variables;
