//! Treeshift Core - Declarative JSON-to-JSON transformation engine
//!
//! This crate compiles transform specs (JSON documents describing where
//! input values go) and runs them against `serde_json::Value` trees.
//!
//! # Main Components
//!
//! - **Shift**: relocate and rename values by walking the spec and the input
//!   in parallel, with wildcards and back-references
//! - **Defaults**: fill in missing values
//! - **Removal**: delete keys
//! - **Chain**: run stages in sequence, configured from JSON
//! - **Error Handling**: error types using `thiserror`, `anyhow` at the host boundary
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//!
//! let spec = json!({
//!     "rating": {
//!         "primary": {"value": "Rating"},
//!         "*": {"value": "SecondaryRatings.&1.Value"}
//!     }
//! });
//! let input = json!({"rating": {"primary": {"value": 3}, "quality": {"value": 4}}});
//!
//! let output = treeshift_core::transform(&input, &spec).unwrap();
//! assert_eq!(
//!     output,
//!     json!({"Rating": 3, "SecondaryRatings": {"quality": {"Value": 4}}})
//! );
//! ```

pub mod chain;
pub mod config;
pub mod default;
pub mod error;
pub mod path;
pub mod remove;
pub mod shift;
pub mod spec;
pub mod traversal;
pub mod walked;

mod proptest_strategies;

// Re-export main types for convenience
pub use chain::{Chain, Context, StageRegistry, Transform};
pub use config::{ChainSpec, StageSpec};
pub use default::Defaults;
pub use error::{Error, EvaluationError, Result, SpecError};
pub use remove::Removal;
pub use shift::Shift;

use serde_json::Value;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compile `spec` as a shift spec and run it once against `input`
///
/// Compile with [`Shift::new`] instead when the same spec is applied to many
/// inputs.
pub fn transform(input: &Value, spec: &Value) -> Result<Value> {
    Shift::new(spec)?.apply(input)
}
