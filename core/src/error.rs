//! Error types for grammar resolution and value lookup.
//!
//! [`ParseError`] covers everything the engine can reject on a command line;
//! its `Display` output is the exact line shown to the user.
//! [`BuildError`] covers tree construction and freeing, [`LookupError`]
//! the typed accessors used by handlers.

use thiserror::Error;

use crate::types::{NodeId, NodeKind};
use crate::value::ValueKind;

/// A command line rejected by the resolution engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A non-option token matched neither a subcommand nor an input.
    #[error("[!] Unknown command: `{0}`")]
    UnknownCommand(String),
    /// No option in the scope chain matched the token.
    #[error("[!] Unknown option: `{0}`")]
    UnknownOption(String),
    /// A value-bearing option was given in its no-value form.
    #[error("[!] Not a boolean option: `--{0}`")]
    NotABoolean(String),
    /// The option's coercer rejected the value.
    #[error("[!] Invalid value: `{value}`, for option: `--{name}`")]
    InvalidValue { name: String, value: String },
    /// A required input's validator rejected the token.
    #[error("[!] Invalid value: `{value}`, for input: `{name}`")]
    InvalidInput { name: String, value: String },
    /// A required input received no value.
    #[error("[!] Missing value for input: `{0}`")]
    MissingInput(String),
    /// A required option was never given.
    #[error("[!] Missing value for option: `--{0}`")]
    MissingOption(String),
}

impl ParseError {
    /// `NotABoolean` aborts the whole program instead of returning a code.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ParseError::NotABoolean(_))
    }

    /// Status reported for this error: `1` for the fatal kind, `-1` otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.is_fatal() { 1 } else { -1 }
    }
}

/// Grammar construction and ownership errors.
///
/// Attaching is all-or-nothing: when a [`Grammar::command`](crate::Grammar::command)
/// call fails, no child has been attached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// The node already has an owning command (or appears twice in one child list).
    #[error("node {0} is already attached to a command")]
    AlreadyAttached(NodeId),
    /// The handle does not refer to a live node, e.g. it was freed.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    /// A command-only operation was applied to another kind of node.
    #[error("node {0} is not a command")]
    NotACommand(NodeId),
    /// Only detached nodes can be freed.
    #[error("node {node} is still attached to {owner}")]
    StillAttached { node: NodeId, owner: NodeId },
}

/// A typed accessor could not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The path does not resolve to any node.
    #[error("no node at path `{0}`")]
    NotFound(String),
    /// The path resolves to a node of another kind.
    #[error("node at `{path}` is {found}, expected {expected}")]
    KindMismatch {
        path: String,
        expected: String,
        found: String,
    },
}

impl LookupError {
    pub(crate) fn node(path: &str, expected: NodeKind, found: NodeKind) -> Self {
        LookupError::KindMismatch {
            path: path.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub(crate) fn value(path: &str, expected: ValueKind, found: ValueKind) -> Self {
        LookupError::KindMismatch {
            path: path.to_string(),
            expected: format!("{expected} option"),
            found: format!("{found} option"),
        }
    }
}
