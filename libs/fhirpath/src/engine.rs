//! Engine facade and public entry points.
//!
//! An engine pairs the evaluator with the model navigator for one FHIR
//! version and caches parsed expressions. Engines are independent:
//! evaluations on separate engines (or separate resources) may run in
//! parallel without coordination; a single evaluation is synchronous and
//! runs to completion on the caller's thread.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;
use serde_json::Value as JsonValue;

use crate::ast::Expr;
use crate::context::Clock;
use crate::error::{Error, Result};
use crate::evaluator::Evaluator;
use crate::model::JsonNavigator;
use crate::parser;
use crate::types::FhirVersion;
use crate::value::{Collection, Node, Value};
use crate::variables::Variables;

const AST_CACHE_SIZE: usize = 1000;

pub struct Engine {
    navigator: JsonNavigator,
    cache: Mutex<LruCache<String, Arc<Expr>>>,
}

impl Engine {
    pub fn new(version: FhirVersion) -> Self {
        Self {
            navigator: JsonNavigator::new(version),
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(AST_CACHE_SIZE).expect("cache size is non-zero"),
            )),
        }
    }

    pub fn r4() -> Self {
        Self::new(FhirVersion::R4)
    }

    pub fn r4b() -> Self {
        Self::new(FhirVersion::R4B)
    }

    pub fn r5() -> Self {
        Self::new(FhirVersion::R5)
    }

    /// Parse an expression, reusing the cached AST when the same text has
    /// been evaluated before.
    pub fn parse(&self, expression: &str) -> Result<Arc<Expr>> {
        {
            let mut cache = self
                .cache
                .lock()
                .map_err(|_| Error::Parse("expression cache poisoned".to_string()))?;
            if let Some(ast) = cache.get(expression) {
                return Ok(Arc::clone(ast));
            }
        }
        let ast = Arc::new(parser::parse(expression)?);
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| Error::Parse("expression cache poisoned".to_string()))?;
        cache.put(expression.to_string(), Arc::clone(&ast));
        Ok(ast)
    }

    /// Evaluate an expression against an optional root resource with the
    /// given environment variables. The result is the final collection
    /// with residual FHIR-typed primitives converted to System values.
    pub fn evaluate(
        &self,
        expression: &str,
        resource: Option<&JsonValue>,
        variables: &Variables,
    ) -> Result<Collection> {
        let ast = self.parse(expression)?;
        let resource = match resource {
            Some(json) => {
                Collection::singleton(Value::Node(Node::root(Arc::new(json.clone()))))
            }
            None => Collection::empty(),
        };
        let evaluator = Evaluator {
            navigator: &self.navigator,
            variables,
            resource,
            clock: Clock::capture(),
        };
        Ok(evaluator.evaluate(&ast)?.into_system())
    }
}

/// One-shot convenience entry bound to FHIR R4.
pub fn evaluate(
    expression: &str,
    resource: Option<&JsonValue>,
    variables: &Variables,
) -> Result<Collection> {
    Engine::r4().evaluate(expression, resource, variables)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cache_returns_shared_asts() {
        let engine = Engine::r5();
        let a = engine.parse("1 + 2").unwrap();
        let b = engine.parse("1 + 2").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn parse_errors_surface() {
        let engine = Engine::r4();
        assert!(matches!(
            engine.evaluate("1 +", None, &Variables::new()),
            Err(Error::Parse(_))
        ));
    }
}
