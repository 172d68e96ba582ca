//! Command grammar trees and argument resolution.
//!
//! This crate lets an executable declare its command line as a tree and
//! resolve `argv` against it:
//!
//! - [`CommandNode`] is a (sub)command with an optional handler.
//! - [`OptionNode`] is a typed switch addressable as `--name` and `-c`,
//!   holding a [`Value`] slot.
//! - [`InputNode`] is a positional slot, optionally validated, required or
//!   repeatable.
//! - [`UsageNode`] is the help banner of a command.
//!
//! Nodes live in a [`Grammar`] arena and are attached to their command with
//! [`Grammar::command`]. [`Grammar::run`] scans the arguments, fills the
//! value slots and calls the handler of the deepest command entered; errors
//! are reported as [`ParseError`] and rendered through a [`Renderer`].
//!
//! # Example
//!
//! ```
//! use kmnd_core::*;
//!
//! let recorder = Recorder::new();
//! let mut grammar = Grammar::with_output(recorder.clone());
//!
//! let url = grammar.option(OptionNode::string(Some('u'), "url", None));
//! let fetch = grammar
//!     .command(CommandNode::new("fetch").with_description("Fetch a URL"), [url])
//!     .unwrap();
//! let verbose = grammar.option(OptionNode::new(Some('v'), "verbose", false));
//! let root = grammar.command(CommandNode::new("tool"), [fetch, verbose]).unwrap();
//!
//! grammar.run(root, &["fetch", "-v", "--url=https://example.org"]).unwrap();
//! assert_eq!(grammar.get::<bool>(root, "verbose"), Ok(true));
//! assert_eq!(grammar.get_str(root, "fetch.url"), Ok(Some("https://example.org")));
//!
//! assert!(grammar.run(root, &["nope"]).is_err());
//! assert_eq!(recorder.contents(), "[!] Unknown command: `nope`\n\n");
//! ```

mod describe;
mod engine;
mod error;
mod grammar;
mod path;
mod render;
mod terminal;
mod types;
mod usage;
mod value;

pub use describe::{CommandDescription, InputDescription, OptionDescription};
pub use error::{BuildError, LookupError, ParseError};
pub use grammar::{Grammar, Scope};
pub use render::{Line, Recorder, Renderer, Span, Style};
pub use terminal::{ColorMode, DEFAULT_WIDTH, Terminal, TerminalConfig};
pub use types::*;
pub use usage::{UsageNode, layout, markup};
pub use value::{
    CoerceError, FromValue, IntegerKind, Value, ValueKind, parse_boolean, parse_double,
    parse_float, parse_integer,
};
