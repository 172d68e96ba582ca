//! Grammar node definitions.
//!
//! A grammar is a tree of four node kinds: commands own options, inputs,
//! nested commands and at most one usage banner. Nodes are plain data; the
//! [`Grammar`](crate::Grammar) arena owns them and hands out [`NodeId`]
//! handles.

use std::cell::Cell;
use std::fmt;
use std::ops::BitOr;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::grammar::Scope;
use crate::usage::UsageNode;
use crate::value::{CoerceError, Value, ValueKind};

/// Handle to a node stored in a [`Grammar`](crate::Grammar).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Behaviour flags for options and inputs.
///
/// # Examples
///
/// ```
/// use kmnd_core::Flags;
///
/// let flags = Flags::REQUIRED | Flags::MULTIPLE;
/// assert!(flags.contains(Flags::REQUIRED));
/// assert!(!Flags::NONE.contains(Flags::MULTIPLE));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Flags(u8);

impl Flags {
    pub const NONE: Flags = Flags(0);
    /// The option or input must be supplied.
    pub const REQUIRED: Flags = Flags(1 << 0);
    /// The input keeps accepting positional values.
    pub const MULTIPLE: Flags = Flags(1 << 1);

    /// True when every bit of `other` is set.
    pub fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

/// Discriminant of a [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Command,
    Option,
    Input,
    Usage,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Command => "command",
            NodeKind::Option => "option",
            NodeKind::Input => "input",
            NodeKind::Usage => "usage",
        };
        f.write_str(name)
    }
}

/// A grammar node. The kind is fixed at creation.
pub enum Node {
    Command(CommandNode),
    Option(OptionNode),
    Input(InputNode),
    Usage(UsageNode),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Command(_) => NodeKind::Command,
            Node::Option(_) => NodeKind::Option,
            Node::Input(_) => NodeKind::Input,
            Node::Usage(_) => NodeKind::Usage,
        }
    }

    /// Name used for path lookup. Usage nodes report their template.
    pub fn name(&self) -> &str {
        match self {
            Node::Command(c) => &c.name,
            Node::Option(o) => &o.name,
            Node::Input(i) => &i.name,
            Node::Usage(u) => &u.command,
        }
    }

    /// Free-form help text, if any.
    pub fn description(&self) -> Option<&str> {
        match self {
            Node::Command(c) => c.description.as_deref(),
            Node::Option(o) => o.description.as_deref(),
            Node::Input(i) => i.description.as_deref(),
            Node::Usage(u) => Some(&u.description),
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Command(c) => c.fmt(f),
            Node::Option(o) => o.fmt(f),
            Node::Input(i) => i.fmt(f),
            Node::Usage(u) => u.fmt(f),
        }
    }
}

/// Callback invoked when a command is the last one matched on the line.
pub type Handler = Rc<dyn Fn(&Scope<'_>)>;

/// Validator deciding whether a positional token belongs to an input. It
/// sees the command being resolved, including options parsed so far.
pub type Validator = Rc<dyn Fn(&Scope<'_>, &str) -> bool>;

/// A (sub)command.
///
/// The child sequences are filled by [`Grammar::command`](crate::Grammar::command)
/// and keep the order in which children were supplied.
///
/// # Examples
///
/// ```
/// use kmnd_core::CommandNode;
///
/// let cmd = CommandNode::new("push").with_description("Push commits");
/// assert_eq!(cmd.name, "push");
/// assert!(cmd.commands().is_empty());
/// ```
pub struct CommandNode {
    pub name: String,
    pub description: Option<String>,
    pub(crate) run: Option<Handler>,
    pub(crate) commands: Vec<NodeId>,
    pub(crate) options: Vec<NodeId>,
    pub(crate) inputs: Vec<NodeId>,
    pub(crate) usage: Option<NodeId>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) output: Option<Box<dyn crate::render::Renderer>>,
}

impl CommandNode {
    /// A command without description, handler or children.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            run: None,
            commands: Vec::new(),
            options: Vec::new(),
            inputs: Vec::new(),
            usage: None,
            parent: None,
            output: None,
        }
    }

    /// Sets the one-line summary shown in the parent's banner.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Sets the handler run when this command is selected.
    pub fn with_run<F>(mut self, run: F) -> Self
    where
        F: Fn(&Scope<'_>) + 'static,
    {
        self.run = Some(Rc::new(run));
        self
    }

    /// Whether a handler is set.
    pub fn has_run(&self) -> bool {
        self.run.is_some()
    }

    /// Child commands, in attach order.
    pub fn commands(&self) -> &[NodeId] {
        &self.commands
    }

    /// Options owned by this command, in attach order.
    pub fn options(&self) -> &[NodeId] {
        &self.options
    }

    /// Inputs owned by this command, filled in this order.
    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    /// The help banner, if one was attached.
    pub fn usage(&self) -> Option<NodeId> {
        self.usage
    }

    /// Non-owning link to the enclosing command, `None` for a root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("run", &self.run.is_some())
            .field("commands", &self.commands)
            .field("options", &self.options)
            .field("inputs", &self.inputs)
            .field("usage", &self.usage)
            .field("parent", &self.parent)
            .finish()
    }
}

/// A named switch addressable as `--name` and optionally `-c`.
///
/// The value slot starts out holding the default and is overwritten when
/// the option is given on the command line.
///
/// # Examples
///
/// ```
/// use kmnd_core::{OptionNode, ValueKind};
///
/// let port = OptionNode::new(Some('p'), "port", 8080u16).with_description("Listen port");
/// assert_eq!(port.kind(), ValueKind::Uint16);
/// assert!(!port.takes_flag());
///
/// let verbose = OptionNode::new(Some('v'), "verbose", false);
/// assert!(verbose.takes_flag());
/// ```
#[derive(Debug, Clone)]
pub struct OptionNode {
    pub character: Option<char>,
    pub name: String,
    pub description: Option<String>,
    pub flags: Flags,
    pub(crate) value: Value,
    pub(crate) activated: bool,
}

impl OptionNode {
    pub fn new(character: Option<char>, name: &str, default: impl Into<Value>) -> Self {
        Self {
            character,
            name: name.to_string(),
            description: None,
            flags: Flags::NONE,
            value: default.into(),
            activated: false,
        }
    }

    /// A string option, optionally without a default value.
    pub fn string(character: Option<char>, name: &str, default: Option<&str>) -> Self {
        Self::new(character, name, Value::String(default.map(String::from)))
    }

    /// Sets the text shown next to the option in the banner.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Replaces the behaviour flags.
    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    /// Marks the option as mandatory.
    pub fn required(self) -> Self {
        let flags = self.flags | Flags::REQUIRED;
        self.with_flags(flags)
    }

    /// Type of the value slot.
    pub fn kind(&self) -> ValueKind {
        self.value.kind()
    }

    /// Current value: the default until the option is parsed.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Whether [`Flags::REQUIRED`] is set.
    pub fn is_required(&self) -> bool {
        self.flags.contains(Flags::REQUIRED)
    }

    /// Whether a value was parsed from the command line.
    pub fn is_activated(&self) -> bool {
        self.activated
    }

    /// Whether the option can be given without a value (`--name`, `-c`).
    pub fn takes_flag(&self) -> bool {
        self.value.takes_flag()
    }

    /// Applies the no-value form. Returns `false` for non-boolean options.
    ///
    /// Only a parsed value marks the option activated, so a required
    /// boolean must be given as `--name=<bool>`.
    pub fn flag(&mut self) -> bool {
        self.value.flag()
    }

    /// Coerces `raw` into the value slot and marks the option activated.
    ///
    /// # Errors
    ///
    /// Returns the coercion failure; the slot keeps its previous value.
    pub fn parse(&mut self, raw: &str) -> Result<(), CoerceError> {
        self.value.parse(raw)?;
        self.activated = true;
        Ok(())
    }
}

/// A positional value slot.
///
/// Values accumulate in order; without [`Flags::MULTIPLE`] the engine never
/// stores more than one.
///
/// # Examples
///
/// ```
/// use kmnd_core::{CommandNode, Flags, Grammar, InputNode, Recorder, Scope};
///
/// let files = InputNode::new("files")
///     .with_flags(Flags::REQUIRED | Flags::MULTIPLE)
///     .with_validator(|_, s| !s.is_empty());
/// assert!(files.is_required());
/// assert!(files.is_multiple());
///
/// let mut grammar = Grammar::with_output(Recorder::new());
/// let cat = grammar.command(CommandNode::new("cat"), []).unwrap();
/// assert!(files.accepts(&Scope::new(&grammar, cat), "a.txt"));
/// ```
#[derive(Clone)]
pub struct InputNode {
    pub name: String,
    pub description: Option<String>,
    pub flags: Flags,
    pub(crate) validator: Option<Validator>,
    pub(crate) values: Vec<String>,
    cursor: Cell<usize>,
}

impl InputNode {
    /// An optional, single-valued input without a validator.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            flags: Flags::NONE,
            validator: None,
            values: Vec::new(),
            cursor: Cell::new(0),
        }
    }

    /// Sets the text shown next to the input in the banner.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Replaces the behaviour flags.
    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    /// Marks the input as mandatory.
    pub fn required(self) -> Self {
        let flags = self.flags | Flags::REQUIRED;
        self.with_flags(flags)
    }

    /// Keeps the input open for every following positional token.
    pub fn multiple(self) -> Self {
        let flags = self.flags | Flags::MULTIPLE;
        self.with_flags(flags)
    }

    /// Sets the predicate a token must pass to be stored in this input.
    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Scope<'_>, &str) -> bool + 'static,
    {
        self.validator = Some(Rc::new(validator));
        self
    }

    /// Whether [`Flags::REQUIRED`] is set.
    pub fn is_required(&self) -> bool {
        self.flags.contains(Flags::REQUIRED)
    }

    /// Whether [`Flags::MULTIPLE`] is set.
    pub fn is_multiple(&self) -> bool {
        self.flags.contains(Flags::MULTIPLE)
    }

    /// An input is activated once it holds at least one value.
    pub fn is_activated(&self) -> bool {
        !self.values.is_empty()
    }

    /// Runs the validator in `scope`; no validator accepts everything.
    pub fn accepts(&self, scope: &Scope<'_>, token: &str) -> bool {
        self.validator.as_ref().is_none_or(|validate| validate(scope, token))
    }

    pub(crate) fn push(&mut self, token: &str) {
        self.values.push(token.to_string());
    }

    /// First accumulated value.
    pub fn value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    /// Every accumulated value, in command-line order.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Returns the value under the read cursor and advances it.
    pub fn next_value(&self) -> Option<&str> {
        let at = self.cursor.get();
        let value = self.values.get(at)?;
        self.cursor.set(at + 1);
        Some(value)
    }

    /// Moves the read cursor back to the first value.
    pub fn rewind(&self) {
        self.cursor.set(0);
    }
}

impl fmt::Debug for InputNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputNode")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("flags", &self.flags)
            .field("validator", &self.validator.is_some())
            .field("values", &self.values)
            .field("cursor", &self.cursor.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Grammar;
    use crate::render::Recorder;

    #[test]
    fn test_flags_combine() {
        let flags = Flags::REQUIRED | Flags::MULTIPLE;
        assert!(flags.contains(Flags::REQUIRED));
        assert!(flags.contains(Flags::MULTIPLE));
        assert!(Flags::REQUIRED.contains(Flags::NONE));
        assert!(!Flags::REQUIRED.contains(Flags::MULTIPLE));
    }

    #[test]
    fn test_option_name_description_flags() {
        let option = OptionNode::new(Some('i'), "uint16", 904u16)
            .with_description("This is a uint16.")
            .required();

        assert_eq!(option.character, Some('i'));
        assert_eq!(option.name, "uint16");
        assert_eq!(option.description.as_deref(), Some("This is a uint16."));
        assert_eq!(option.flags, Flags::REQUIRED);
        assert_eq!(option.value(), &Value::Uint16(904));
        assert!(!option.is_activated());
    }

    #[test]
    fn test_flag_only_applies_to_booleans() {
        let mut boolean = OptionNode::new(Some('f'), "foo", false);
        assert!(boolean.flag());
        assert_eq!(boolean.value(), &Value::Boolean(true));
        assert!(!boolean.is_activated());

        boolean.parse("yes").unwrap();
        assert!(boolean.is_activated());

        let mut string = OptionNode::string(Some('s'), "name", None);
        assert!(!string.flag());
        assert!(!string.is_activated());
    }

    #[test]
    fn test_failed_parse_keeps_previous_value() {
        let mut option = OptionNode::new(None, "level", 3i8);
        assert!(option.parse("300").is_err());
        assert_eq!(option.value(), &Value::Int8(3));
        assert!(!option.is_activated());

        option.parse("-7").unwrap();
        assert_eq!(option.value(), &Value::Int8(-7));
        assert!(option.is_activated());
    }

    #[test]
    fn test_input_activation_and_cursor() {
        let mut input = InputNode::new("foobar")
            .with_description("This is foobar")
            .required();
        assert!(!input.is_activated());
        assert!(input.is_required());

        input.push("seafood");
        input.push("salad");
        assert!(input.is_activated());
        assert_eq!(input.value(), Some("seafood"));
        assert_eq!(input.next_value(), Some("seafood"));
        assert_eq!(input.next_value(), Some("salad"));
        assert_eq!(input.next_value(), None);

        input.rewind();
        assert_eq!(input.next_value(), Some("seafood"));
    }

    #[test]
    fn test_input_validator() {
        let mut grammar = Grammar::with_output(Recorder::new());
        let root = grammar.command(CommandNode::new("root"), []).unwrap();
        let scope = Scope::new(&grammar, root);

        let input = InputNode::new("digits").with_validator(|_, s| s.chars().all(|c| c.is_ascii_digit()));
        assert!(input.accepts(&scope, "123"));
        assert!(!input.accepts(&scope, "abc"));
        assert!(InputNode::new("any").accepts(&scope, "whatever"));
    }

    #[test]
    fn test_validator_reads_scope() {
        let mut grammar = Grammar::with_output(Recorder::new());
        let strict = grammar.option(OptionNode::new(None, "strict", true));
        let root = grammar.command(CommandNode::new("root"), [strict]).unwrap();

        let input = InputNode::new("name")
            .with_validator(|scope, s| !scope.get::<bool>("strict").unwrap_or(false) || !s.contains(' '));
        assert!(!input.accepts(&Scope::new(&grammar, root), "two words"));
        assert!(input.accepts(&Scope::new(&grammar, root), "one"));
    }
}
