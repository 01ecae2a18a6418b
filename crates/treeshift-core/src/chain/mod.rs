//! Chaining transforms into a pipeline
//!
//! A [`Chain`] runs a list of stages in order, each stage receiving the
//! output of the one before it. Stages are built from a [`ChainSpec`] by a
//! [`StageRegistry`], which maps operation names (`shift`, `default`,
//! `remove`, or anything a host registers) to constructors.
//!
//! Copyright (c) 2025 Treeshift Team
//! Licensed under the Apache-2.0 license

mod registry;

pub use registry::{StageConstructor, StageRegistry};

use crate::config::ChainSpec;
use crate::error::{Error, Result};
use log::debug;
use serde_json::{Map, Value};
use std::fmt;

/// Read-only values handed to every stage of a run
pub type Context = Map<String, Value>;

/// A compiled transform that can run as a chain stage
pub trait Transform: Send + Sync {
    /// Transform one input document
    fn transform(&self, input: Value, context: &Context) -> Result<Value>;
}

/// A built stage together with the operation it came from
struct Stage {
    operation: String,
    transform: Box<dyn Transform>,
}

/// An ordered pipeline of transforms
pub struct Chain {
    stages: Vec<Stage>,
}

impl Chain {
    /// Build every stage of `spec` with `registry`
    ///
    /// Fails on the first unknown operation or invalid stage spec, naming the
    /// stage it came from.
    pub fn from_spec(spec: &ChainSpec, registry: &StageRegistry) -> Result<Self> {
        let mut stages = Vec::with_capacity(spec.len());
        for (index, stage) in spec.stages().iter().enumerate() {
            let transform = registry
                .construct(&stage.operation, &stage.spec)
                .map_err(|e| Error::Stage {
                    index,
                    operation: stage.operation.clone(),
                    source: Box::new(e),
                })?;
            stages.push(Stage {
                operation: stage.operation.clone(),
                transform,
            });
        }
        debug!("Built chain with {} stages", stages.len());
        Ok(Self { stages })
    }

    /// Build a chain from a JSON stage list using the built-in operations
    pub fn from_value(value: Value) -> Result<Self> {
        Self::from_spec(&ChainSpec::from_value(value)?, &StageRegistry::with_builtins())
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Operation names in stage order
    pub fn operations(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.operation.as_str()).collect()
    }
}

impl Transform for Chain {
    fn transform(&self, input: Value, context: &Context) -> Result<Value> {
        let mut current = input;
        for (index, stage) in self.stages.iter().enumerate() {
            debug!("Running stage {} ('{}')", index, stage.operation);
            current = stage
                .transform
                .transform(current, context)
                .map_err(|e| Error::Stage {
                    index,
                    operation: stage.operation.clone(),
                    source: Box::new(e),
                })?;
        }
        Ok(current)
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("operations", &self.operations())
            .finish()
    }
}
