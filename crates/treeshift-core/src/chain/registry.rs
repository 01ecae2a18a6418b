//! Operation registry for chain stages

use super::Transform;
use crate::default::Defaults;
use crate::error::{Error, Result};
use crate::remove::Removal;
use crate::shift::Shift;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Builds a stage from its spec document
pub type StageConstructor = Box<dyn Fn(&Value) -> Result<Box<dyn Transform>> + Send + Sync>;

/// Maps operation names to stage constructors
pub struct StageRegistry {
    constructors: HashMap<String, StageConstructor>,
}

impl StageRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// A registry with `shift`, `default` and `remove`
    pub fn with_builtins() -> Self {
        Self::new()
            .register("shift", |spec| Ok(Box::new(Shift::new(spec)?)))
            .register("default", |spec| Ok(Box::new(Defaults::new(spec)?)))
            .register("remove", |spec| Ok(Box::new(Removal::new(spec)?)))
    }

    /// Register (or replace) an operation
    pub fn register<F>(mut self, operation: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&Value) -> Result<Box<dyn Transform>> + Send + Sync + 'static,
    {
        self.constructors
            .insert(operation.into(), Box::new(constructor));
        self
    }

    pub fn contains(&self, operation: &str) -> bool {
        self.constructors.contains_key(operation)
    }

    /// Registered operation names, sorted
    pub fn operations(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Build a stage for `operation`
    pub fn construct(&self, operation: &str, spec: &Value) -> Result<Box<dyn Transform>> {
        let constructor = self.constructors.get(operation).ok_or_else(|| {
            Error::configuration(format!(
                "unknown operation '{}', expected one of: {}",
                operation,
                self.operations().join(", ")
            ))
        })?;
        constructor(spec)
    }
}

impl Default for StageRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for StageRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageRegistry")
            .field("operations", &self.operations())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Context;
    use serde_json::json;

    struct Constant(Value);

    impl Transform for Constant {
        fn transform(&self, _input: Value, _context: &Context) -> Result<Value> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_builtins_are_registered() {
        let registry = StageRegistry::default();
        assert_eq!(registry.operations(), vec!["default", "remove", "shift"]);
        assert!(registry.contains("shift"));
        assert!(!registry.contains("sort"));
    }

    #[test]
    fn test_construct_builtin() {
        let registry = StageRegistry::with_builtins();
        let stage = registry.construct("shift", &json!({"a": "b"})).unwrap();
        let output = stage.transform(json!({"a": 1}), &Context::new()).unwrap();
        assert_eq!(output, json!({"b": 1}));
    }

    #[test]
    fn test_unknown_operation() {
        let err = StageRegistry::new()
            .construct("shift", &json!({}))
            .err()
            .unwrap();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_custom_operation() {
        let registry = StageRegistry::new()
            .register("constant", |spec| Ok(Box::new(Constant(spec.clone()))));
        let stage = registry.construct("constant", &json!(42)).unwrap();
        assert_eq!(stage.transform(Value::Null, &Context::new()).unwrap(), json!(42));
    }

    #[test]
    fn test_constructor_errors_surface() {
        let registry = StageRegistry::with_builtins();
        let err = registry.construct("shift", &json!("not an object")).err().unwrap();
        assert!(err.is_spec_error());
    }
}
