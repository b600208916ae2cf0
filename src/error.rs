// SPDX-License-Identifier: MIT

//! Typed error handling for pipeline-simulator
//!
//! Every layer owns a small error enum; `SimulatorError` is the top-level
//! type handed to the command line layer.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for a simulation run
#[derive(Debug, Error)]
pub enum SimulatorError {
    /// The pipeline file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document could not be expanded
    #[error(transparent)]
    Expand(#[from] ExpandError),

    /// The expanded document does not have the expected shape
    #[error("failed to extract jobs and stages: {0}")]
    Extract(#[from] ExtractError),

    /// Serialization of a report or expanded document failed
    #[error("failed to serialize output: {0}")]
    Serialize(String),
}

/// Errors raised while turning YAML text into a tree
#[derive(Debug, Error)]
pub enum LoadError {
    /// YAML syntax error reported by the scanner/parser
    #[error("failed to parse YAML: {0}")]
    Syntax(#[from] yaml_rust2::scanner::ScanError),

    /// Input is not valid UTF-8
    #[error("input is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// More than one document in the stream
    #[error("expected a single YAML document, found {0}")]
    MultipleDocuments(usize),
}

/// Errors raised by the expander
#[derive(Debug, Error)]
pub enum ExpandError {
    #[error(transparent)]
    Load(#[from] LoadError),

    /// An alias that (transitively) contains itself
    #[error("cyclic alias: {}", .0.join(" -> "))]
    CyclicAlias(Vec<String>),

    /// A `!reference` whose target (transitively) references itself
    #[error("cyclic reference: {}", .0.join(" -> "))]
    CyclicReference(Vec<String>),
}

/// Errors raised while extracting jobs from the expanded tree
#[derive(Debug, Error, PartialEq)]
pub enum ExtractError {
    #[error("document is empty")]
    EmptyDocument,

    #[error("root node is not a mapping (found {0})")]
    RootNotMapping(&'static str),
}

/// Errors raised while compiling or evaluating a rule condition
#[derive(Debug, Error, PartialEq)]
pub enum ConditionError {
    /// The rewritten condition could not be tokenized or parsed
    #[error("failed to parse condition `{input}`: {message}")]
    Parse { input: String, message: String },

    /// Operand types do not fit the operator
    #[error("type error: {0}")]
    Type(String),

    /// Bare identifier with no binding in the environment
    #[error("no variable '{0}' found")]
    UnknownVariable(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("{name} requires exactly {expected} arguments, got {found}")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid regex pattern: {0}")]
    InvalidPattern(String),
}

impl ConditionError {
    /// Create a parse error
    pub fn parse(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            input: input.into(),
            message: message.into(),
        }
    }

    /// Create a type error
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::Type(message.into())
    }
}

impl From<regex::Error> for ConditionError {
    fn from(err: regex::Error) -> Self {
        Self::InvalidPattern(err.to_string())
    }
}

impl From<serde_json::Error> for SimulatorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize(err.to_string())
    }
}

impl From<serde_yaml::Error> for SimulatorError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialize(err.to_string())
    }
}
