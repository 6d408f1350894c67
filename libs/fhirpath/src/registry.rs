//! Function registry: name → arity metadata.
//!
//! A compile-time perfect-hash map gives O(1) lookups with no runtime
//! allocation. Unknown names are fatal (`UnknownIdentifier`); arity
//! violations are parse-adjacent errors raised before evaluation of the
//! call. Higher-order functions are flagged so the evaluator knows to
//! re-evaluate their argument ASTs per element instead of eagerly.

use phf::phf_map;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy)]
pub struct FunctionSpec {
    pub name: &'static str,
    pub min_args: usize,
    /// `None` = unbounded.
    pub max_args: Option<usize>,
    /// Arguments are evaluated per element with `$this`/`$index` bound.
    pub higher_order: bool,
    /// Arguments are type specifiers, not expressions to evaluate.
    pub type_args: bool,
}

impl FunctionSpec {
    const fn plain(name: &'static str, min_args: usize, max_args: usize) -> Self {
        Self {
            name,
            min_args,
            max_args: Some(max_args),
            higher_order: false,
            type_args: false,
        }
    }

    const fn hof(name: &'static str, min_args: usize, max_args: usize) -> Self {
        Self {
            name,
            min_args,
            max_args: Some(max_args),
            higher_order: true,
            type_args: false,
        }
    }

    const fn with_type_args(name: &'static str, min_args: usize, max_args: usize) -> Self {
        Self {
            name,
            min_args,
            max_args: Some(max_args),
            higher_order: false,
            type_args: true,
        }
    }
}

static FUNCTIONS: phf::Map<&'static str, FunctionSpec> = phf_map! {
    // Existence
    "empty" => FunctionSpec::plain("empty", 0, 0),
    "exists" => FunctionSpec::hof("exists", 0, 1),
    "all" => FunctionSpec::hof("all", 1, 1),
    "allTrue" => FunctionSpec::plain("allTrue", 0, 0),
    "anyTrue" => FunctionSpec::plain("anyTrue", 0, 0),
    "allFalse" => FunctionSpec::plain("allFalse", 0, 0),
    "anyFalse" => FunctionSpec::plain("anyFalse", 0, 0),
    "subsetOf" => FunctionSpec::plain("subsetOf", 1, 1),
    "supersetOf" => FunctionSpec::plain("supersetOf", 1, 1),
    "count" => FunctionSpec::plain("count", 0, 0),
    "distinct" => FunctionSpec::plain("distinct", 0, 0),
    "isDistinct" => FunctionSpec::plain("isDistinct", 0, 0),

    // Filtering and projection
    "where" => FunctionSpec::hof("where", 1, 1),
    "select" => FunctionSpec::hof("select", 1, 1),
    "repeat" => FunctionSpec::hof("repeat", 1, 1),
    "ofType" => FunctionSpec::with_type_args("ofType", 1, 1),

    // Subsetting
    "single" => FunctionSpec::plain("single", 0, 0),
    "first" => FunctionSpec::plain("first", 0, 0),
    "last" => FunctionSpec::plain("last", 0, 0),
    "tail" => FunctionSpec::plain("tail", 0, 0),
    "skip" => FunctionSpec::plain("skip", 1, 1),
    "take" => FunctionSpec::plain("take", 1, 1),
    "intersect" => FunctionSpec::plain("intersect", 1, 1),
    "exclude" => FunctionSpec::plain("exclude", 1, 1),

    // Combining
    "union" => FunctionSpec::plain("union", 1, 1),
    "combine" => FunctionSpec::plain("combine", 1, 1),

    // Conversion
    "iif" => FunctionSpec::hof("iif", 2, 3),
    "toBoolean" => FunctionSpec::plain("toBoolean", 0, 0),
    "convertsToBoolean" => FunctionSpec::plain("convertsToBoolean", 0, 0),
    "toInteger" => FunctionSpec::plain("toInteger", 0, 0),
    "convertsToInteger" => FunctionSpec::plain("convertsToInteger", 0, 0),
    "toDecimal" => FunctionSpec::plain("toDecimal", 0, 0),
    "convertsToDecimal" => FunctionSpec::plain("convertsToDecimal", 0, 0),
    "toString" => FunctionSpec::plain("toString", 0, 0),
    "convertsToString" => FunctionSpec::plain("convertsToString", 0, 0),
    "toDate" => FunctionSpec::plain("toDate", 0, 0),
    "convertsToDate" => FunctionSpec::plain("convertsToDate", 0, 0),
    "toDateTime" => FunctionSpec::plain("toDateTime", 0, 0),
    "convertsToDateTime" => FunctionSpec::plain("convertsToDateTime", 0, 0),
    "toTime" => FunctionSpec::plain("toTime", 0, 0),
    "convertsToTime" => FunctionSpec::plain("convertsToTime", 0, 0),
    "toQuantity" => FunctionSpec::plain("toQuantity", 0, 1),
    "convertsToQuantity" => FunctionSpec::plain("convertsToQuantity", 0, 1),

    // Strings
    "indexOf" => FunctionSpec::plain("indexOf", 1, 1),
    "lastIndexOf" => FunctionSpec::plain("lastIndexOf", 1, 1),
    "substring" => FunctionSpec::plain("substring", 1, 2),
    "startsWith" => FunctionSpec::plain("startsWith", 1, 1),
    "endsWith" => FunctionSpec::plain("endsWith", 1, 1),
    "contains" => FunctionSpec::plain("contains", 1, 1),
    "upper" => FunctionSpec::plain("upper", 0, 0),
    "lower" => FunctionSpec::plain("lower", 0, 0),
    "replace" => FunctionSpec::plain("replace", 2, 2),
    "matches" => FunctionSpec::plain("matches", 1, 1),
    "matchesFull" => FunctionSpec::plain("matchesFull", 1, 1),
    "replaceMatches" => FunctionSpec::plain("replaceMatches", 2, 2),
    "length" => FunctionSpec::plain("length", 0, 0),
    "toChars" => FunctionSpec::plain("toChars", 0, 0),
    "trim" => FunctionSpec::plain("trim", 0, 0),
    "split" => FunctionSpec::plain("split", 1, 1),
    "join" => FunctionSpec::plain("join", 0, 1),

    // Math
    "abs" => FunctionSpec::plain("abs", 0, 0),
    "ceiling" => FunctionSpec::plain("ceiling", 0, 0),
    "floor" => FunctionSpec::plain("floor", 0, 0),
    "truncate" => FunctionSpec::plain("truncate", 0, 0),
    "round" => FunctionSpec::plain("round", 0, 1),
    "sqrt" => FunctionSpec::plain("sqrt", 0, 0),
    "ln" => FunctionSpec::plain("ln", 0, 0),
    "log" => FunctionSpec::plain("log", 1, 1),
    "exp" => FunctionSpec::plain("exp", 0, 0),
    "power" => FunctionSpec::plain("power", 1, 1),

    // Tree navigation
    "children" => FunctionSpec::plain("children", 0, 0),
    "descendants" => FunctionSpec::plain("descendants", 0, 0),

    // Utility
    "now" => FunctionSpec::plain("now", 0, 0),
    "today" => FunctionSpec::plain("today", 0, 0),
    "timeOfDay" => FunctionSpec::plain("timeOfDay", 0, 0),
    "trace" => FunctionSpec::hof("trace", 1, 2),
    "not" => FunctionSpec::plain("not", 0, 0),

    // Boundaries
    "lowBoundary" => FunctionSpec::plain("lowBoundary", 0, 1),
    "highBoundary" => FunctionSpec::plain("highBoundary", 0, 1),
    "precision" => FunctionSpec::plain("precision", 0, 0),

    // Types
    "is" => FunctionSpec::with_type_args("is", 1, 1),
    "as" => FunctionSpec::with_type_args("as", 1, 1),
    "type" => FunctionSpec::plain("type", 0, 0),

    // Aggregates
    "aggregate" => FunctionSpec::hof("aggregate", 1, 2),
};

pub fn lookup(name: &str) -> Option<&'static FunctionSpec> {
    FUNCTIONS.get(name)
}

/// Resolve a function and validate its argument count.
pub fn validate(name: &str, arg_count: usize) -> Result<&'static FunctionSpec> {
    let spec = lookup(name)
        .ok_or_else(|| Error::UnknownIdentifier(format!("unknown function '{name}()'")))?;
    if arg_count < spec.min_args {
        return Err(Error::Parse(format!(
            "{name}() requires at least {} argument(s), got {arg_count}",
            spec.min_args
        )));
    }
    if let Some(max) = spec.max_args {
        if arg_count > max {
            return Err(Error::Parse(format!(
                "{name}() takes at most {max} argument(s), got {arg_count}"
            )));
        }
    }
    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_full_surface_is_registered() {
        let names = [
            "empty", "exists", "all", "allTrue", "anyTrue", "allFalse", "anyFalse",
            "subsetOf", "supersetOf", "count", "distinct", "isDistinct", "where", "select",
            "repeat", "ofType", "single", "first", "last", "tail", "skip", "take",
            "intersect", "exclude", "union", "combine", "iif", "toBoolean",
            "convertsToBoolean", "toInteger", "convertsToInteger", "toDecimal",
            "convertsToDecimal", "toString", "convertsToString", "toDate",
            "convertsToDate", "toDateTime", "convertsToDateTime", "toTime",
            "convertsToTime", "toQuantity", "convertsToQuantity", "indexOf",
            "lastIndexOf", "substring", "startsWith", "endsWith", "contains", "upper",
            "lower", "replace", "matches", "matchesFull", "replaceMatches", "length",
            "toChars", "trim", "split", "join", "abs", "ceiling", "floor", "truncate",
            "round", "sqrt", "ln", "log", "exp", "power", "children", "descendants",
            "now", "today", "timeOfDay", "trace", "not", "lowBoundary", "highBoundary",
            "precision", "is", "as", "type", "aggregate",
        ];
        for name in names {
            assert!(lookup(name).is_some(), "function '{name}' is not registered");
        }
    }

    #[test]
    fn arity_validation() {
        assert!(validate("empty", 0).is_ok());
        assert!(validate("empty", 1).is_err());
        assert!(validate("where", 0).is_err());
        assert!(validate("substring", 2).is_ok());
        assert!(validate("substring", 3).is_err());
        assert!(matches!(
            validate("frobnicate", 0),
            Err(Error::UnknownIdentifier(_))
        ));
    }

    #[test]
    fn higher_order_flags() {
        assert!(lookup("where").unwrap().higher_order);
        assert!(lookup("aggregate").unwrap().higher_order);
        assert!(!lookup("count").unwrap().higher_order);
        assert!(lookup("ofType").unwrap().type_args);
    }
}
