//! Error types for the FHIRPath engine.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// FHIRPath evaluation errors.
///
/// Unknown *property* access is not an error (it yields the empty
/// collection); every other unknown surface is fatal and propagates to the
/// caller unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Malformed or partially consumed expression.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A function requiring at most one input element received more.
    #[error("Cardinality error: {0}")]
    Cardinality(String),

    /// Operands whose kinds cannot be implicitly reconciled.
    #[error("Type error: {0}")]
    Type(String),

    /// Unknown environment variable, function, or type name.
    #[error("Unknown identifier: {0}")]
    UnknownIdentifier(String),

    /// Functionality recognized by the grammar but not provided here.
    #[error("Unimplemented: {0}")]
    Unimplemented(String),
}
