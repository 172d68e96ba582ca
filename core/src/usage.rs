//! Help banner layout.
//!
//! [`layout`] turns a command's usage node and children into styled
//! [`Line`]s. Descriptions and the command template accept a small inline
//! markup: `` `code` ``, ` ``literal`` `, `**strong**` and `*emphasis*`.

use std::sync::LazyLock;

use regex::Regex;
use unicode_width::UnicodeWidthStr;

use crate::grammar::Grammar;
use crate::render::{Line, Span, Style};
use crate::types::NodeId;

/// Help banner attached to a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageNode {
    /// Invocation template, e.g. ``sample `PATH` ``.
    pub command: String,
    pub description: String,
}

impl UsageNode {
    pub fn new(command: &str, description: &str) -> Self {
        Self {
            command: command.to_string(),
            description: description.to_string(),
        }
    }
}

const HELP_ENTRY: &str = "    -h/--help  ";
const HELP_DESCRIPTION: &str = "Show help banner of specified command";
const MIN_COLUMN: usize = 15;
const ENTRY_PREFIX: usize = 6;

static MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"``([^`]*)``|`([^`]*)`|\*\*([^*]+)\*\*|\*([^*]+)\*").expect("markup regex")
});

/// Splits `text` into spans, applying inline markup on top of `base`.
///
/// # Examples
///
/// ```
/// use kmnd_core::{markup, Style};
///
/// let spans = markup("run ``x`` or `y`", Style::Plain);
/// let text: String = spans.iter().map(|s| s.text.as_str()).collect();
/// assert_eq!(text, "run `x` or y");
/// assert_eq!(spans[1].style, Style::Code);
/// ```
pub fn markup(text: &str, base: Style) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut last = 0;

    for caps in MARKUP.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            spans.push(Span::new(&text[last..whole.start()], base));
        }
        let span = if let Some(literal) = caps.get(1) {
            Span::new(format!("`{}`", literal.as_str()), Style::Code)
        } else if let Some(code) = caps.get(2) {
            Span::new(code.as_str(), Style::Code)
        } else if let Some(strong) = caps.get(3) {
            Span::new(strong.as_str(), Style::Strong)
        } else if let Some(emphasis) = caps.get(4) {
            Span::new(emphasis.as_str(), Style::Emphasis)
        } else {
            continue;
        };
        spans.push(span);
        last = whole.end();
    }

    if last < text.len() {
        spans.push(Span::new(&text[last..], base));
    }
    spans
}

/// Width of the entry column shared by the commands, input and options
/// sections.
fn column_width(grammar: &Grammar, command: NodeId) -> usize {
    let Some(cmd) = grammar.command_node(command) else {
        return MIN_COLUMN;
    };

    let commands = cmd
        .commands()
        .iter()
        .filter_map(|&id| grammar.command_node(id))
        .map(|sub| ENTRY_PREFIX + sub.name.width() + 2);
    let inputs = cmd
        .inputs()
        .iter()
        .filter_map(|&id| grammar.input_node(id))
        .map(|input| ENTRY_PREFIX + input.name.width() + 2);
    let options = cmd
        .options()
        .iter()
        .filter_map(|&id| grammar.option_node(id))
        .map(|option| {
            let short = if option.character.is_some() { 3 } else { 0 };
            ENTRY_PREFIX + option.name.width() + 2 + short
        });

    commands
        .chain(inputs)
        .chain(options)
        .fold(MIN_COLUMN, usize::max)
}

fn section(lines: &mut Vec<Line>, heading: &str) {
    lines.push(Line::blank());
    lines.push(Line::styled(heading, Style::Heading));
    lines.push(Line::blank());
}

fn describe(text: Option<&str>) -> Vec<Span> {
    markup(text.unwrap_or_default(), Style::Plain)
}

/// Lays out the help banner of `command`.
///
/// Returns `None` when the command has no usage node.
pub fn layout(grammar: &Grammar, command: NodeId) -> Option<Vec<Line>> {
    let cmd = grammar.command_node(command)?;
    let usage = grammar.usage_node(cmd.usage()?)?;

    let width = column_width(grammar, command);
    let indent = " ".repeat(width);

    let mut lines = vec![
        Line::styled("Usage:", Style::Heading),
        Line::blank(),
        Line::new()
            .indent("    $ ")
            .push("    $ ", Style::Plain)
            .extend(markup(&usage.command, Style::Command)),
        Line::blank(),
        Line::new()
            .indent("      ")
            .push("      ", Style::Plain)
            .extend(markup(&usage.description, Style::Plain)),
    ];

    let commands: Vec<_> = cmd
        .commands()
        .iter()
        .filter_map(|&id| grammar.command_node(id))
        .collect();
    if !commands.is_empty() {
        section(&mut lines, "Commands:");
        for sub in commands {
            let pad = width.saturating_sub(ENTRY_PREFIX + sub.name.width());
            lines.push(
                Line::new()
                    .indent(indent.clone())
                    .push("    + ", Style::Command)
                    .push(sub.name.as_str(), Style::Command)
                    .push(" ".repeat(pad), Style::Plain)
                    .extend(describe(sub.description.as_deref())),
            );
        }
    }

    let inputs: Vec<_> = cmd
        .inputs()
        .iter()
        .filter_map(|&id| grammar.input_node(id))
        .collect();
    if !inputs.is_empty() {
        section(&mut lines, "Input:");
        for input in inputs {
            let pad = width.saturating_sub(ENTRY_PREFIX + input.name.width());
            lines.push(
                Line::new()
                    .indent(indent.clone())
                    .push("      ", Style::Input)
                    .push(input.name.as_str(), Style::Input)
                    .push(" ".repeat(pad), Style::Plain)
                    .extend(describe(input.description.as_deref())),
            );
        }
    }

    section(&mut lines, "Options:");
    for option in cmd.options().iter().filter_map(|&id| grammar.option_node(id)) {
        let (flag, used) = match option.character {
            Some(c) => (format!("    -{c}/--{}", option.name), 3),
            None => (format!("    --{}", option.name), 0),
        };
        let pad = width.saturating_sub(ENTRY_PREFIX + option.name.width() + used);
        lines.push(
            Line::new()
                .indent(indent.clone())
                .push(flag, Style::Option)
                .push(" ".repeat(pad), Style::Plain)
                .extend(describe(option.description.as_deref())),
        );
    }
    lines.push(
        Line::new()
            .indent(indent.clone())
            .push(HELP_ENTRY, Style::Option)
            .push(" ".repeat(width.saturating_sub(HELP_ENTRY.len())), Style::Plain)
            .push(HELP_DESCRIPTION, Style::Plain),
    );

    Some(lines)
}
