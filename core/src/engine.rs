//! Argument resolution.
//!
//! Tokens are scanned left to right against one command at a time. A
//! subcommand name seen before any option hands the rest of the line to that
//! subcommand; everything else is an option or a positional value of the
//! current command. Only the deepest command entered is validated and run.

use tracing::{debug, warn};

use crate::error::ParseError;
use crate::grammar::{Grammar, Scope};
use crate::render::{Line, Style};
use crate::types::{NodeId, OptionNode};
use crate::usage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    Commands,
    Options,
    Positionals,
}

impl Grammar {
    /// Resolves `args` (without the program name) against `root`.
    ///
    /// On success the selected command's handler has run, or its usage was
    /// printed. Every error has already been rendered when this returns.
    ///
    /// # Examples
    ///
    /// ```
    /// use kmnd_core::{CommandNode, Grammar, OptionNode, ParseError, Recorder};
    ///
    /// let recorder = Recorder::new();
    /// let mut g = Grammar::with_output(recorder.clone());
    /// let root = g.command(CommandNode::new("tool"), []).unwrap();
    ///
    /// let err = g.run(root, &["--nope"]).unwrap_err();
    /// assert_eq!(err, ParseError::UnknownOption("--nope".into()));
    /// assert_eq!(recorder.contents(), "[!] Unknown option: `--nope`\n\n");
    /// ```
    pub fn run<S: AsRef<str>>(&mut self, root: NodeId, args: &[S]) -> Result<(), ParseError> {
        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        if self.command_node(root).is_none() {
            warn!(%root, "run called on a node that is not a command");
            return Err(ParseError::UnknownCommand(root.to_string()));
        }
        self.invoke(root, &args)
    }

    /// Runs `root` with the process arguments and returns the exit status.
    ///
    /// A value-bearing option given without a value terminates the process
    /// with status 1 after the error is printed. Arguments that are not valid
    /// UTF-8 are converted lossily.
    pub fn main(&mut self, root: NodeId) -> i32 {
        let args: Vec<String> = std::env::args_os()
            .skip(1)
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        match self.run(root, &args) {
            Ok(()) => 0,
            Err(error) if error.is_fatal() => std::process::exit(error.exit_code()),
            Err(error) => error.exit_code(),
        }
    }

    fn invoke(&mut self, command: NodeId, args: &[&str]) -> Result<(), ParseError> {
        let mut stage = Stage::Commands;
        let mut cursor = 0;

        for (i, &arg) in args.iter().enumerate() {
            if arg.is_empty() {
                continue;
            }

            if arg.starts_with('-') {
                stage = stage.max(Stage::Options);
                if (arg == "-h" || arg == "--help") && self.has_usage(command) {
                    debug!(%command, "help requested");
                    self.render_usage(command);
                    return Ok(());
                }
                if let Err(error) = self.match_option(command, arg) {
                    return Err(self.fail(command, error));
                }
                continue;
            }

            if stage == Stage::Options {
                stage = Stage::Positionals;
            }
            if stage == Stage::Commands {
                if let Some(sub) = self.subcommand(command, arg) {
                    debug!(%command, %sub, name = arg, "entering subcommand");
                    return self.invoke(sub, &args[i + 1..]);
                }
            }
            if let Err(error) = self.consume_positional(command, &mut cursor, arg) {
                return Err(self.fail(command, error));
            }
        }

        self.finish(command)
    }

    fn subcommand(&self, command: NodeId, name: &str) -> Option<NodeId> {
        let cmd = self.command_node(command)?;
        cmd.commands()
            .iter()
            .copied()
            .find(|&id| self.command_node(id).is_some_and(|sub| sub.name == name))
    }

    /// First option satisfying `matches`, searching `scope` and then each
    /// ancestor.
    fn find_option(&self, scope: NodeId, matches: impl Fn(&OptionNode) -> bool) -> Option<NodeId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let cmd = self.command_node(id)?;
            let found = cmd
                .options()
                .iter()
                .copied()
                .find(|&opt| self.option_node(opt).is_some_and(&matches));
            if found.is_some() {
                return found;
            }
            current = cmd.parent();
        }
        None
    }

    fn match_option(&mut self, command: NodeId, token: &str) -> Result<(), ParseError> {
        if token == "-" || token == "--" {
            return Err(ParseError::UnknownOption(token.to_string()));
        }

        if let Some(long) = token.strip_prefix("--") {
            let (name, value) = match long.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (long, None),
            };
            let option = self
                .find_option(command, |o| o.name == name)
                .ok_or_else(|| ParseError::UnknownOption(token.to_string()))?;
            return self.apply(option, token, value);
        }

        let bundle: Vec<char> = token.chars().skip(1).collect();
        for (k, &c) in bundle.iter().enumerate() {
            let option = self
                .find_option(command, |o| o.character == Some(c))
                .ok_or_else(|| ParseError::UnknownOption(format!("-{c}")))?;
            if bundle.get(k + 1) == Some(&'=') {
                let value = token.split_once('=').map_or("", |(_, value)| value);
                return self.apply(option, token, Some(value));
            }
            self.apply(option, token, None)?;
        }
        Ok(())
    }

    fn apply(&mut self, id: NodeId, token: &str, value: Option<&str>) -> Result<(), ParseError> {
        let Some(option) = self.option_node_mut(id) else {
            return Err(ParseError::UnknownOption(token.to_string()));
        };

        match value {
            None if option.flag() => {
                debug!(option = %option.name, "switch set");
                Ok(())
            }
            None => Err(ParseError::NotABoolean(option.name.clone())),
            Some(raw) => match option.parse(raw) {
                Ok(()) => {
                    debug!(option = %option.name, value = raw, "option set");
                    Ok(())
                }
                Err(reason) => {
                    debug!(option = %option.name, value = raw, %reason, "option rejected value");
                    Err(ParseError::InvalidValue {
                        name: option.name.clone(),
                        value: raw.to_string(),
                    })
                }
            },
        }
    }

    /// Feeds `token` to the first remaining input that accepts it.
    ///
    /// `cursor` persists across the whole scan: optional inputs that reject
    /// a token are skipped for good, and only `MULTIPLE` inputs keep it.
    fn consume_positional(&mut self, command: NodeId, cursor: &mut usize, token: &str) -> Result<(), ParseError> {
        let inputs = self
            .command_node(command)
            .map(|cmd| cmd.inputs().to_vec())
            .unwrap_or_default();

        while let Some(&id) = inputs.get(*cursor) {
            let accepted = match self.input_node(id) {
                Some(input) => input.accepts(&Scope::new(self, command), token),
                None => false,
            };
            let Some(input) = self.input_node_mut(id) else {
                *cursor += 1;
                continue;
            };

            if accepted {
                input.push(token);
                debug!(input = %input.name, value = token, "positional accepted");
                if !input.is_multiple() {
                    *cursor += 1;
                }
                return Ok(());
            }
            if input.is_required() {
                return Err(ParseError::InvalidInput {
                    name: input.name.clone(),
                    value: token.to_string(),
                });
            }
            debug!(input = %input.name, value = token, "optional input skipped");
            *cursor += 1;
        }

        Err(ParseError::UnknownCommand(token.to_string()))
    }

    fn finish(&mut self, command: NodeId) -> Result<(), ParseError> {
        if let Some(error) = self.missing(command) {
            return Err(self.fail(command, error));
        }

        match self.command_node(command).and_then(|cmd| cmd.run.clone()) {
            Some(run) => {
                debug!(%command, "running handler");
                run(&Scope::new(self, command));
            }
            None => self.render_usage(command),
        }
        Ok(())
    }

    fn missing(&self, command: NodeId) -> Option<ParseError> {
        let cmd = self.command_node(command)?;

        let option = cmd
            .options()
            .iter()
            .filter_map(|&id| self.option_node(id))
            .find(|o| o.is_required() && !o.is_activated())
            .map(|o| ParseError::MissingOption(o.name.clone()));

        option.or_else(|| {
            cmd.inputs()
                .iter()
                .filter_map(|&id| self.input_node(id))
                .find(|i| i.is_required() && !i.is_activated())
                .map(|i| ParseError::MissingInput(i.name.clone()))
        })
    }

    fn has_usage(&self, command: NodeId) -> bool {
        self.command_node(command)
            .is_some_and(|cmd| cmd.usage().is_some())
    }

    fn render_usage(&mut self, command: NodeId) {
        if let Some(lines) = usage::layout(self, command) {
            self.emit(command, &lines);
        }
    }

    /// Renders `error` for `command`, followed by its usage unless fatal.
    fn fail(&mut self, command: NodeId, error: ParseError) -> ParseError {
        debug!(%command, %error, "resolution failed");
        let lines = [Line::styled(error.to_string(), Style::Error), Line::blank()];
        self.emit(command, &lines);
        if !error.is_fatal() {
            self.render_usage(command);
        }
        error
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::render::Recorder;
    use crate::types::{CommandNode, InputNode};
    use crate::usage::UsageNode;
    use crate::value::Value;

    fn counter() -> (Rc<Cell<u32>>, impl Fn(&Scope<'_>) + 'static) {
        let count = Rc::new(Cell::new(0));
        let handle = Rc::clone(&count);
        (count, move |_: &Scope<'_>| handle.set(handle.get() + 1))
    }

    #[test]
    fn test_stage_order() {
        assert!(Stage::Commands < Stage::Options);
        assert!(Stage::Options < Stage::Positionals);
    }

    #[test]
    fn test_bare_dashes_are_unknown_options() {
        let recorder = Recorder::new();
        let mut g = Grammar::with_output(recorder.clone());
        let unnamed = g.option(OptionNode::new(None, "quiet", false));
        let root = g.command(CommandNode::new("root"), [unnamed]).unwrap();

        assert_eq!(g.run(root, &["-"]), Err(ParseError::UnknownOption("-".into())));
        assert_eq!(g.run(root, &["--"]), Err(ParseError::UnknownOption("--".into())));
        assert!(!g.option_node(unnamed).unwrap().is_activated());
    }

    #[test]
    fn test_long_names_do_not_abbreviate() {
        let mut g = Grammar::with_output(Recorder::new());
        let foo = g.option(OptionNode::new(None, "foo", false));
        let root = g.command(CommandNode::new("root"), [foo]).unwrap();
        assert_eq!(g.run(root, &["--fo"]), Err(ParseError::UnknownOption("--fo".into())));
    }

    #[test]
    fn test_short_value_takes_rest_after_equals() {
        let mut g = Grammar::with_output(Recorder::new());
        let flag = g.option(OptionNode::new(Some('f'), "foo", false));
        let url = g.option(OptionNode::string(Some('u'), "url", None));
        let root = g.command(CommandNode::new("root"), [flag, url]).unwrap();

        g.run(root, &["-fu=http://x/?a=b"]).unwrap();
        assert_eq!(g.get::<bool>(root, "foo"), Ok(true));
        assert_eq!(g.get_str(root, "url"), Ok(Some("http://x/?a=b")));
    }

    #[test]
    fn test_not_a_boolean_skips_usage() {
        let recorder = Recorder::new();
        let mut g = Grammar::with_output(recorder.clone());
        let url = g.option(OptionNode::string(Some('u'), "url", None));
        let usage = g.usage(UsageNode::new("root", "Root"));
        let root = g.command(CommandNode::new("root"), [url, usage]).unwrap();

        let err = g.run(root, &["-u"]).unwrap_err();
        assert_eq!(err, ParseError::NotABoolean("url".into()));
        assert!(err.is_fatal());
        assert_eq!(recorder.contents(), "[!] Not a boolean option: `--url`\n\n");
    }

    #[test]
    fn test_handler_or_usage_after_success() {
        let recorder = Recorder::new();
        let mut g = Grammar::with_output(recorder.clone());
        let usage = g.usage(UsageNode::new("root", "Root"));
        let root = g.command(CommandNode::new("root"), [usage]).unwrap();
        g.run::<&str>(root, &[]).unwrap();
        assert!(recorder.contents().starts_with("Usage:\n"));

        let (count, run) = counter();
        let mut g = Grammar::with_output(Recorder::new());
        let root = g.command(CommandNode::new("root").with_run(run), []).unwrap();
        g.run::<&str>(root, &[]).unwrap();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_empty_tokens_are_skipped() {
        let mut g = Grammar::with_output(Recorder::new());
        let file = g.input(InputNode::new("file").required());
        let root = g.command(CommandNode::new("root"), [file]).unwrap();
        g.run(root, &["", "a.txt", ""]).unwrap();
        assert_eq!(g.get_input(root, "file").unwrap().values(), ["a.txt"]);
    }

    #[test]
    fn test_failed_value_keeps_default() {
        let mut g = Grammar::with_output(Recorder::new());
        let level = g.option(OptionNode::new(Some('l'), "level", 3u8));
        let root = g.command(CommandNode::new("root"), [level]).unwrap();

        let err = g.run(root, &["--level=256"]).unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidValue {
                name: "level".into(),
                value: "256".into()
            }
        );
        assert_eq!(g.option_node(level).unwrap().value(), &Value::Uint8(3));
    }

    #[test]
    fn test_run_rejects_non_command_root() {
        let mut g = Grammar::with_output(Recorder::new());
        let opt = g.option(OptionNode::new(None, "x", false));
        assert!(matches!(
            g.run::<&str>(opt, &[]),
            Err(ParseError::UnknownCommand(_))
        ));
    }
}
