//! Chain configuration documents
//!
//! A chain is configured as a JSON array of stages:
//!
//! ```json
//! [
//!   {"operation": "shift", "spec": {"rating": "score"}},
//!   {"operation": "default", "spec": {"score": 0}}
//! ]
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// One stage of a chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSpec {
    /// Registered operation name, e.g. `shift`
    pub operation: String,
    /// Spec document handed to the operation's constructor
    #[serde(default)]
    pub spec: Value,
}

/// An ordered list of stages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainSpec {
    stages: Vec<StageSpec>,
}

impl StageSpec {
    pub fn new(operation: impl Into<String>, spec: Value) -> Self {
        Self {
            operation: operation.into(),
            spec,
        }
    }
}

impl ChainSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a chain from an already parsed document
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_array() {
            return Err(Error::configuration(
                "a chain must be an array of {\"operation\", \"spec\"} objects",
            ));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Read a chain from JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Read a chain from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::Io {
            message: format!("failed to read chain file {}: {}", path.display(), e),
            source: e,
        })?;
        Self::from_json_str(&text)
    }

    /// Append a stage
    pub fn push(mut self, operation: impl Into<String>, spec: Value) -> Self {
        self.stages.push(StageSpec::new(operation, spec));
        self
    }

    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_parse_stage_list() {
        let chain = ChainSpec::from_json_str(
            r#"[{"operation": "shift", "spec": {"a": "b"}}, {"operation": "remove"}]"#,
        )
        .unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.stages()[0], StageSpec::new("shift", json!({"a": "b"})));
        assert_eq!(chain.stages()[1].spec, Value::Null);
    }

    #[test]
    fn test_builder_matches_parsed_form() {
        let built = ChainSpec::new()
            .push("shift", json!({"a": "b"}))
            .push("default", json!({"c": 1}));
        let parsed = ChainSpec::from_value(serde_json::to_value(&built).unwrap()).unwrap();
        assert_eq!(built, parsed);
    }

    #[test]
    fn test_rejects_non_array() {
        assert!(matches!(
            ChainSpec::from_value(json!({"operation": "shift"})),
            Err(Error::Configuration { .. })
        ));
        assert!(matches!(
            ChainSpec::from_value(json!([{"spec": {}}])),
            Err(Error::Json { .. })
        ));
        assert!(matches!(
            ChainSpec::from_json_str("[oops"),
            Err(Error::Json { .. })
        ));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"operation": "shift", "spec": {{"x": "y"}}}}]"#).unwrap();

        let chain = ChainSpec::from_path(file.path()).unwrap();
        assert_eq!(chain.stages()[0].operation, "shift");

        assert!(matches!(
            ChainSpec::from_path(file.path().with_extension("missing")),
            Err(Error::Io { .. })
        ));
    }
}
