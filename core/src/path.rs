//! Dotted path resolution.
//!
//! `a.b.c` is resolved from the root of the tree the scope belongs to;
//! `.b.c` from the scope itself. Within a command, names are searched among
//! subcommands first, then options, then inputs.

use crate::grammar::Grammar;
use crate::types::NodeId;

impl Grammar {
    /// Resolves `path` relative to `scope`.
    ///
    /// An empty path and a lone `.` both resolve to `scope`. Every segment
    /// but the last must name a command.
    ///
    /// # Examples
    ///
    /// ```
    /// use kmnd_core::{CommandNode, Grammar, OptionNode, Recorder};
    ///
    /// let mut g = Grammar::with_output(Recorder::new());
    /// let bar = g.option(OptionNode::string(Some('b'), "bar", None));
    /// let xyz = g.command(CommandNode::new("xyz"), [bar]).unwrap();
    /// let root = g.command(CommandNode::new("root"), [xyz]).unwrap();
    ///
    /// assert_eq!(g.resolve(root, "xyz.bar"), Some(bar));
    /// assert_eq!(g.resolve(xyz, ".bar"), Some(bar));
    /// assert_eq!(g.resolve(xyz, "bar"), None);
    /// ```
    pub fn resolve(&self, scope: NodeId, path: &str) -> Option<NodeId> {
        self.node(scope)?;
        if path.is_empty() {
            return Some(scope);
        }

        let (anchor, rest) = match path.strip_prefix('.') {
            Some(rest) => (scope, rest),
            None => (self.root_of(scope)?, path),
        };
        if rest.is_empty() {
            return Some(anchor);
        }

        let segments: Vec<&str> = rest.split('.').collect();
        let (last, parents) = segments.split_last()?;

        let mut current = anchor;
        for segment in parents {
            current = self
                .find_child(current, segment)
                .filter(|&id| self.command_node(id).is_some())?;
        }
        self.find_child(current, last)
    }

    fn find_child(&self, command: NodeId, name: &str) -> Option<NodeId> {
        let cmd = self.command_node(command)?;

        let commands = cmd
            .commands()
            .iter()
            .copied()
            .find(|&id| self.command_node(id).is_some_and(|c| c.name == name));
        let options = || {
            cmd.options()
                .iter()
                .copied()
                .find(|&id| self.option_node(id).is_some_and(|o| o.name == name))
        };
        let inputs = || {
            cmd.inputs()
                .iter()
                .copied()
                .find(|&id| self.input_node(id).is_some_and(|i| i.name == name))
        };

        commands.or_else(options).or_else(inputs)
    }
}
