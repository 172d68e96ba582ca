//! Serializable snapshot of a grammar tree.

use serde::{Deserialize, Serialize};

use crate::grammar::Grammar;
use crate::types::NodeId;
use crate::value::ValueKind;

/// A command with its options, inputs and subcommands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandDescription {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Usage template, when the command has a help banner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionDescription>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<InputDescription>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<CommandDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionDescription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    pub long: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub kind: ValueKind,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDescription {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub multiple: bool,
}

impl CommandDescription {
    pub fn find_command(&self, name: &str) -> Option<&CommandDescription> {
        self.commands.iter().find(|c| c.name == name)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Grammar {
    /// Snapshot of `command` and everything below it.
    ///
    /// # Examples
    ///
    /// ```
    /// use kmnd_core::{CommandNode, Grammar, OptionNode, Recorder, ValueKind};
    ///
    /// let mut g = Grammar::with_output(Recorder::new());
    /// let port = g.option(OptionNode::new(Some('p'), "port", 80u16).required());
    /// let root = g.command(CommandNode::new("serve"), [port]).unwrap();
    ///
    /// let desc = g.describe(root).unwrap();
    /// assert_eq!(desc.options[0].kind, ValueKind::Uint16);
    /// assert!(desc.options[0].required);
    /// ```
    pub fn describe(&self, command: NodeId) -> Option<CommandDescription> {
        let cmd = self.command_node(command)?;

        let options = cmd
            .options()
            .iter()
            .filter_map(|&id| self.option_node(id))
            .map(|o| OptionDescription {
                short: o.character,
                long: o.name.clone(),
                description: o.description.clone(),
                kind: o.kind(),
                required: o.is_required(),
            })
            .collect();
        let inputs = cmd
            .inputs()
            .iter()
            .filter_map(|&id| self.input_node(id))
            .map(|i| InputDescription {
                name: i.name.clone(),
                description: i.description.clone(),
                required: i.is_required(),
                multiple: i.is_multiple(),
            })
            .collect();
        let commands = cmd
            .commands()
            .iter()
            .filter_map(|&id| self.describe(id))
            .collect();

        Some(CommandDescription {
            name: cmd.name.clone(),
            description: cmd.description.clone(),
            usage: cmd
                .usage()
                .and_then(|id| self.usage_node(id))
                .map(|u| u.command.clone()),
            options,
            inputs,
            commands,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Recorder;
    use crate::types::{CommandNode, InputNode, OptionNode};
    use crate::usage::UsageNode;

    fn sample() -> (Grammar, NodeId) {
        let mut g = Grammar::with_output(Recorder::new());
        let url = g.option(OptionNode::string(Some('u'), "url", None).with_description("Try this URL"));
        let try_cmd = g.command(CommandNode::new("try").with_description("*Try* `something`"), [url]).unwrap();
        let verbose = g.option(OptionNode::new(Some('V'), "verbose", false));
        let path = g.input(InputNode::new("path").required());
        let usage = g.usage(UsageNode::new("sample `PATH`", "Sample"));
        let root = g
            .command(CommandNode::new("sample"), [usage, try_cmd, verbose, path])
            .unwrap();
        (g, root)
    }

    #[test]
    fn test_describe_tree() {
        let (g, root) = sample();
        let desc = g.describe(root).unwrap();

        assert_eq!(desc.name, "sample");
        assert_eq!(desc.usage.as_deref(), Some("sample `PATH`"));
        assert_eq!(desc.options.len(), 1);
        assert_eq!(desc.options[0].short, Some('V'));
        assert_eq!(desc.inputs[0].name, "path");
        assert!(desc.inputs[0].required);
        assert!(!desc.inputs[0].multiple);

        let try_cmd = desc.find_command("try").unwrap();
        assert_eq!(try_cmd.options[0].kind, ValueKind::String);
        assert!(try_cmd.usage.is_none());
    }

    #[test]
    fn test_json_roundtrip_skips_empty_fields() {
        let (g, root) = sample();
        let desc = g.describe(root).unwrap();
        let json = desc.to_json().unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["options"][0]["kind"], "boolean");
        assert!(value["commands"][0].get("inputs").is_none());

        let back: CommandDescription = serde_json::from_str(&json).unwrap();
        assert_eq!(back, desc);
    }

    #[test]
    fn test_describe_non_command() {
        let mut g = Grammar::with_output(Recorder::new());
        let opt = g.option(OptionNode::new(None, "x", false));
        assert!(g.describe(opt).is_none());
    }
}
