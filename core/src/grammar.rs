//! The grammar arena: node storage, tree building, freeing and typed
//! accessors.
//!
//! Nodes are created detached and attached to a command exactly once by
//! [`Grammar::command`]. Every node records its owner, which doubles as the
//! parent link used for scope-chain lookups.

use tracing::{debug, warn};

use crate::error::{BuildError, LookupError};
use crate::render::{Line, Renderer};
use crate::terminal::Terminal;
use crate::types::{CommandNode, InputNode, Node, NodeId, NodeKind, OptionNode};
use crate::usage::UsageNode;
use crate::value::FromValue;

struct Slot {
    node: Node,
    owner: Option<NodeId>,
}

/// Owner of every node of one or more grammar trees.
///
/// # Examples
///
/// ```
/// use kmnd_core::{CommandNode, Grammar, OptionNode, Recorder};
///
/// let mut grammar = Grammar::with_output(Recorder::new());
/// let verbose = grammar.option(OptionNode::new(Some('v'), "verbose", false));
/// let root = grammar.command(CommandNode::new("tool"), [verbose]).unwrap();
///
/// grammar.run(root, &["-v"]).unwrap();
/// assert_eq!(grammar.get::<bool>(root, "verbose"), Ok(true));
/// ```
pub struct Grammar {
    slots: Vec<Option<Slot>>,
    output: Box<dyn Renderer>,
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new()
    }
}

impl Grammar {
    /// An empty grammar rendering to standard output.
    pub fn new() -> Self {
        Self::with_output(Terminal::stdout())
    }

    /// An empty grammar with the given default renderer.
    pub fn with_output(output: impl Renderer + 'static) -> Self {
        Self {
            slots: Vec::new(),
            output: Box::new(output),
        }
    }

    /// Replaces the renderer used by commands without an override.
    pub fn set_default_output(&mut self, output: impl Renderer + 'static) {
        self.output = Box::new(output);
    }

    /// Gives `command` its own renderer. It is dropped with the command.
    pub fn set_output(
        &mut self,
        command: NodeId,
        output: impl Renderer + 'static,
    ) -> Result<(), BuildError> {
        match self.node_mut(command) {
            Some(Node::Command(cmd)) => {
                cmd.output = Some(Box::new(output));
                Ok(())
            }
            Some(_) => Err(BuildError::NotACommand(command)),
            None => Err(BuildError::UnknownNode(command)),
        }
    }

    fn insert(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.slots.len());
        debug!(%id, kind = %node.kind(), name = node.name(), "created node");
        self.slots.push(Some(Slot { node, owner: None }));
        id
    }

    /// Stores a detached option.
    pub fn option(&mut self, option: OptionNode) -> NodeId {
        self.insert(Node::Option(option))
    }

    /// Stores a detached input.
    pub fn input(&mut self, input: InputNode) -> NodeId {
        self.insert(Node::Input(input))
    }

    /// Stores a detached usage banner.
    pub fn usage(&mut self, usage: UsageNode) -> NodeId {
        self.insert(Node::Usage(usage))
    }

    /// Creates a command owning `children`.
    ///
    /// Children are partitioned by kind, keeping their relative order. When
    /// several usage nodes are given the last one wins and the others are
    /// freed.
    ///
    /// # Errors
    ///
    /// [`BuildError::UnknownNode`] for a dead handle and
    /// [`BuildError::AlreadyAttached`] for a child that already has an
    /// owner. On error nothing is attached and the command is not created.
    pub fn command(
        &mut self,
        mut command: CommandNode,
        children: impl IntoIterator<Item = NodeId>,
    ) -> Result<NodeId, BuildError> {
        let children: Vec<NodeId> = children.into_iter().collect();

        let mut usages = Vec::new();
        for (i, &child) in children.iter().enumerate() {
            let slot = self.slot(child).ok_or(BuildError::UnknownNode(child))?;
            if slot.owner.is_some() || children[..i].contains(&child) {
                return Err(BuildError::AlreadyAttached(child));
            }
            match slot.node.kind() {
                NodeKind::Command => command.commands.push(child),
                NodeKind::Option => command.options.push(child),
                NodeKind::Input => command.inputs.push(child),
                NodeKind::Usage => usages.push(child),
            }
        }

        let discarded = usages.len().saturating_sub(1);
        command.usage = usages.pop();

        let id = NodeId(self.slots.len());
        for &child in command.commands.iter() {
            if let Some(Node::Command(sub)) = self.node_mut(child) {
                sub.parent = Some(id);
            }
        }
        let attached: Vec<NodeId> = command
            .commands
            .iter()
            .chain(&command.options)
            .chain(&command.inputs)
            .chain(&command.usage)
            .copied()
            .collect();

        let name = command.name.clone();
        let inserted = self.insert(Node::Command(command));
        debug_assert_eq!(inserted, id);
        for child in attached {
            if let Some(slot) = self.slot_mut(child) {
                slot.owner = Some(id);
            }
        }

        if discarded > 0 {
            warn!(command = %name, discarded, "several usage nodes given, keeping the last");
            for usage in usages {
                self.release(usage, &mut Vec::new());
            }
        }

        Ok(id)
    }

    /// Frees a detached node and everything it owns.
    ///
    /// Returns the released handles in order: child commands (each
    /// recursively), inputs, options, the usage node, then `id` itself.
    pub fn free(&mut self, id: NodeId) -> Result<Vec<NodeId>, BuildError> {
        let slot = self.slot(id).ok_or(BuildError::UnknownNode(id))?;
        if let Some(owner) = slot.owner {
            return Err(BuildError::StillAttached { node: id, owner });
        }

        let mut order = Vec::new();
        self.release(id, &mut order);
        debug!(%id, released = order.len(), "freed subtree");
        Ok(order)
    }

    fn release(&mut self, id: NodeId, order: &mut Vec<NodeId>) {
        let Some(slot) = self.slots.get_mut(id.0).and_then(Option::take) else {
            return;
        };
        if let Node::Command(command) = &slot.node {
            for &child in &command.commands {
                self.release(child, order);
            }
            for &child in command.inputs.iter().chain(&command.options).chain(&command.usage) {
                self.release(child, order);
            }
        }
        order.push(id);
    }

    fn slot(&self, id: NodeId) -> Option<&Slot> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Slot> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// True once every node has been freed, or none was created.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `id` refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.slot(id).is_some()
    }

    /// The node behind `id`, of any kind.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slot(id).map(|slot| &slot.node)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slot_mut(id).map(|slot| &mut slot.node)
    }

    /// The command that owns `id`, if attached.
    pub fn owner(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).and_then(|slot| slot.owner)
    }

    /// Top of the tree containing `id`.
    pub fn root_of(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id)?;
        let mut current = id;
        while let Some(owner) = self.owner(current) {
            current = owner;
        }
        Some(current)
    }

    /// The command behind `id`, `None` for other kinds or dead handles.
    pub fn command_node(&self, id: NodeId) -> Option<&CommandNode> {
        match self.node(id)? {
            Node::Command(command) => Some(command),
            _ => None,
        }
    }

    /// The option behind `id`.
    pub fn option_node(&self, id: NodeId) -> Option<&OptionNode> {
        match self.node(id)? {
            Node::Option(option) => Some(option),
            _ => None,
        }
    }

    /// The input behind `id`.
    pub fn input_node(&self, id: NodeId) -> Option<&InputNode> {
        match self.node(id)? {
            Node::Input(input) => Some(input),
            _ => None,
        }
    }

    /// The usage banner behind `id`.
    pub fn usage_node(&self, id: NodeId) -> Option<&UsageNode> {
        match self.node(id)? {
            Node::Usage(usage) => Some(usage),
            _ => None,
        }
    }

    pub(crate) fn option_node_mut(&mut self, id: NodeId) -> Option<&mut OptionNode> {
        match self.node_mut(id)? {
            Node::Option(option) => Some(option),
            _ => None,
        }
    }

    pub(crate) fn input_node_mut(&mut self, id: NodeId) -> Option<&mut InputNode> {
        match self.node_mut(id)? {
            Node::Input(input) => Some(input),
            _ => None,
        }
    }

    /// Writes `lines` to the command's own renderer, or the default one.
    /// Write failures are logged and otherwise ignored.
    pub(crate) fn emit(&mut self, command: NodeId, lines: &[Line]) {
        let override_output = match self.node_mut(command) {
            Some(Node::Command(cmd)) => cmd.output.as_mut(),
            _ => None,
        };
        let result = match override_output {
            Some(output) => output.lines(lines),
            None => self.output.lines(lines),
        };
        if let Err(error) = result {
            warn!(%error, "failed to write output");
        }
    }

    fn lookup(&self, scope: NodeId, path: &str, expected: NodeKind) -> Result<&Node, LookupError> {
        let node = self
            .resolve(scope, path)
            .and_then(|id| self.node(id))
            .ok_or_else(|| LookupError::NotFound(path.to_string()))?;
        if node.kind() != expected {
            return Err(LookupError::node(path, expected, node.kind()));
        }
        Ok(node)
    }

    /// Reads the typed value of the option at `path`.
    ///
    /// # Errors
    ///
    /// `NotFound` when the path resolves to nothing, `KindMismatch` when it
    /// resolves to a non-option or to an option of another value type.
    pub fn get<'a, T: FromValue<'a>>(&'a self, scope: NodeId, path: &str) -> Result<T, LookupError> {
        let Node::Option(option) = self.lookup(scope, path, NodeKind::Option)? else {
            return Err(LookupError::NotFound(path.to_string()));
        };
        T::from_value(option.value()).ok_or_else(|| LookupError::value(path, T::KIND, option.kind()))
    }

    /// Reads a string option. `Ok(None)` when it has no value.
    pub fn get_str(&self, scope: NodeId, path: &str) -> Result<Option<&str>, LookupError> {
        self.get::<Option<&str>>(scope, path)
    }

    /// The input node at `path`.
    pub fn get_input(&self, scope: NodeId, path: &str) -> Result<&InputNode, LookupError> {
        match self.lookup(scope, path, NodeKind::Input)? {
            Node::Input(input) => Ok(input),
            _ => Err(LookupError::NotFound(path.to_string())),
        }
    }
}

/// The command a handler runs in, with read access to the whole grammar.
#[derive(Clone, Copy)]
pub struct Scope<'g> {
    grammar: &'g Grammar,
    command: NodeId,
}

impl<'g> Scope<'g> {
    /// A view of `grammar` from `command`.
    pub fn new(grammar: &'g Grammar, command: NodeId) -> Self {
        Self { grammar, command }
    }

    /// The whole grammar, for lookups outside this command's tree.
    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    /// The command this scope was opened on.
    pub fn command(&self) -> NodeId {
        self.command
    }

    /// Name of the scoped command.
    pub fn name(&self) -> &'g str {
        self.grammar
            .command_node(self.command)
            .map_or("", |cmd| cmd.name.as_str())
    }

    /// [`Grammar::resolve`] from this scope.
    pub fn resolve(&self, path: &str) -> Option<NodeId> {
        self.grammar.resolve(self.command, path)
    }

    /// [`Grammar::get`] from this scope.
    pub fn get<T: FromValue<'g>>(&self, path: &str) -> Result<T, LookupError> {
        self.grammar.get(self.command, path)
    }

    /// [`Grammar::get_str`] from this scope.
    pub fn get_str(&self, path: &str) -> Result<Option<&'g str>, LookupError> {
        self.grammar.get_str(self.command, path)
    }

    /// [`Grammar::get_input`] from this scope.
    pub fn input(&self, path: &str) -> Result<&'g InputNode, LookupError> {
        self.grammar.get_input(self.command, path)
    }
}
