//! Error types for the Treeshift core library
//!
//! This module defines the error handling system for Treeshift, using
//! thiserror for the error enums and anyhow at the host boundary where
//! custom stages plug into a chain.
//!
//! Errors fall into two fatal families: [`SpecError`] is raised while a spec
//! document is compiled, [`EvaluationError`] while a compiled spec runs
//! against an input. Neither produces partial output.

use thiserror::Error;

/// Main error type for Treeshift operations
#[derive(Error, Debug)]
pub enum Error {
    /// A spec document could not be compiled
    #[error("Invalid spec at '{location}': {source}")]
    InvalidSpec {
        /// Dotted location of the offending key inside the spec document
        location: String,
        #[source]
        source: SpecError,
    },

    /// A compiled spec failed while running against an input
    #[error("Evaluation failed: {0}")]
    Evaluation(#[from] EvaluationError),

    /// Chain or stage configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A chain stage failed
    #[error("Stage {index} ('{operation}') failed: {source}")]
    Stage {
        index: usize,
        operation: String,
        #[source]
        source: Box<Error>,
    },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic internal error with context, typically raised by host stages
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while compiling a spec document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    /// Reference token (`&`, `$`, `#`) that does not follow `X`, `XN`, `X(N)` or `X(N,G)`
    #[error("malformed reference '{token}': {message}")]
    MalformedReference { token: String, message: String },

    /// Reference with a negative path index or key group
    #[error("negative index in reference '{token}'")]
    NegativeReference { token: String },

    /// Two sibling rules share a canonical key
    #[error("duplicate key '{canonical}'")]
    DuplicateKey { canonical: String },

    /// Bracketed array index that is neither `[]`, a number nor a reference
    #[error("invalid array index '[{index}]'")]
    InvalidArrayIndex { index: String },

    /// Separator character where a key was expected
    #[error("illegal character '{character}' in key '{key}'")]
    IllegalCharacter { key: String, character: char },

    /// Spec or stage document with the wrong top-level shape
    #[error("spec root must be {expected}, found {found}")]
    InvalidRoot { expected: String, found: String },

    /// Output path that cannot be parsed
    #[error("invalid output path '{path}': {message}")]
    InvalidOutputPath { path: String, message: String },

    /// Right-hand side of a rule with an unsupported shape
    #[error("invalid value for key '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key that parses but cannot be used where it appears
    #[error("key '{key}' is not allowed here: {message}")]
    UnsupportedKey { key: String, message: String },

    /// Wildcard key whose compiled pattern was rejected
    #[error("invalid wildcard pattern '{key}': {message}")]
    InvalidPattern { key: String, message: String },
}

/// Errors raised while a compiled spec runs against an input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    /// Reference reaching further up than the walked path is deep
    #[error("reference '{reference}' reaches level {path_index} but only {depth} levels were walked")]
    ReferenceOutOfRange {
        reference: String,
        path_index: usize,
        depth: usize,
    },

    /// Reference asking for a wildcard capture the matched key does not have
    #[error("reference '{reference}' asks for key group {key_group} but key '{key}' has {available} captures")]
    KeyGroupOutOfRange {
        reference: String,
        key_group: usize,
        key: String,
        available: usize,
    },

    /// Array index reference resolving to something that is not an index
    #[error("array index '{reference}' resolved to non-numeric key '{value}'")]
    NonNumericIndex { reference: String, value: String },

    /// Array index past the padding limit of the output writer
    #[error("array index {index} exceeds the maximum of {max}")]
    IndexTooLarge { index: String, max: usize },
}

impl SpecError {
    /// Attach the spec location the error was raised at
    pub fn at(self, location: impl Into<String>) -> Error {
        Error::InvalidSpec {
            location: location.into(),
            source: self,
        }
    }
}

impl Error {
    /// Create a configuration error without an underlying cause
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Whether the error was raised while compiling a spec
    pub fn is_spec_error(&self) -> bool {
        match self {
            Error::InvalidSpec { .. } => true,
            Error::Stage { source, .. } => source.is_spec_error(),
            _ => false,
        }
    }

    /// Whether the error was raised while running a compiled spec
    pub fn is_evaluation_error(&self) -> bool {
        match self {
            Error::Evaluation(_) => true,
            Error::Stage { source, .. } => source.is_evaluation_error(),
            _ => false,
        }
    }
}

// Conversion implementations
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
            source: err,
        }
    }
}
