//! Terminal renderer: styled, hard-wrapped output over any writer.

use std::io::{self, Write};

use console::Term;
use serde::{Deserialize, Serialize};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::render::{Line, Renderer, Style};

/// Columns assumed when neither the config nor the sink gives a width.
pub const DEFAULT_WIDTH: usize = 80;

/// When to emit ANSI styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Style only when writing to an attended terminal.
    #[default]
    Auto,
    Always,
    Never,
}

/// Terminal renderer settings.
///
/// # Examples
///
/// ```
/// use kmnd_core::{ColorMode, TerminalConfig};
///
/// let config: TerminalConfig = serde_json::from_str(r#"{"color":"never"}"#).unwrap();
/// assert_eq!(config.color, ColorMode::Never);
/// assert_eq!(config.width, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    pub color: ColorMode,
    /// Overrides the detected column count.
    pub width: Option<usize>,
}

/// Renderer writing styled lines to a byte sink.
pub struct Terminal {
    out: Box<dyn Write>,
    styled: bool,
    width: usize,
}

impl Terminal {
    /// A terminal over an arbitrary writer. `Auto` colour is treated as
    /// unattended, so only `Always` styles the output.
    pub fn new(out: impl Write + 'static, config: &TerminalConfig) -> Self {
        Self {
            out: Box::new(out),
            styled: config.color == ColorMode::Always,
            width: config.width.unwrap_or(DEFAULT_WIDTH).max(1),
        }
    }

    /// The default sink: standard output with default settings.
    pub fn stdout() -> Self {
        Self::from_term(Term::stdout(), &TerminalConfig::default())
    }

    pub fn stderr() -> Self {
        Self::from_term(Term::stderr(), &TerminalConfig::default())
    }

    /// A terminal over a console handle, detecting colour support and size.
    pub fn from_term(term: Term, config: &TerminalConfig) -> Self {
        let attended = term.is_term();
        let styled = match config.color {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => attended && term.features().colors_supported(),
        };
        let width = config
            .width
            .or_else(|| {
                term.size_checked()
                    .map(|(_, columns)| usize::from(columns))
                    .filter(|&columns| columns > 0)
            })
            .unwrap_or(DEFAULT_WIDTH);

        Self {
            out: Box::new(term),
            styled,
            width: width.max(1),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_styled(&self) -> bool {
        self.styled
    }

    fn paint(&self, text: &str, style: Style, buf: &mut String) {
        if text.is_empty() {
            return;
        }
        match console_style(style) {
            Some(painter) if self.styled => {
                buf.push_str(&painter.force_styling(true).apply_to(text).to_string());
            }
            _ => buf.push_str(text),
        }
    }
}

fn console_style(style: Style) -> Option<console::Style> {
    let base = console::Style::new();
    let styled = match style {
        Style::Plain => return None,
        Style::Error => base.red(),
        Style::Heading => base.underlined(),
        Style::Command | Style::Input => base.green(),
        Style::Option => base.blue(),
        Style::Code => base.magenta(),
        Style::Emphasis => base.italic(),
        Style::Strong => base.bold(),
    };
    Some(styled)
}

impl Renderer for Terminal {
    fn line(&mut self, line: &Line) -> io::Result<()> {
        let mut buf = String::new();
        let indent_width = line.indent.width();
        let mut column = 0;

        for span in &line.spans {
            let mut chunk = String::new();
            for c in span.text.chars() {
                let width = c.width().unwrap_or(0);
                if c == '\n' || (column > 0 && column + width > self.width) {
                    self.paint(&chunk, span.style, &mut buf);
                    chunk.clear();
                    buf.push('\n');
                    buf.push_str(&line.indent);
                    column = indent_width;
                    if c == '\n' {
                        continue;
                    }
                }
                chunk.push(c);
                column += width;
            }
            self.paint(&chunk, span.style, &mut buf);
        }
        buf.push('\n');

        self.out.write_all(buf.as_bytes())?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Shared(Rc<RefCell<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Shared {
        fn text(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).unwrap()
        }
    }

    fn terminal(color: ColorMode, width: usize) -> (Terminal, Shared) {
        let sink = Shared::default();
        let config = TerminalConfig {
            color,
            width: Some(width),
        };
        (Terminal::new(sink.clone(), &config), sink)
    }

    #[test]
    fn test_plain_output_without_styling() {
        let (mut term, sink) = terminal(ColorMode::Never, 80);
        term.line(&Line::styled("[!] Unknown option: `--x`", Style::Error))
            .unwrap();
        term.line(&Line::blank()).unwrap();
        assert_eq!(sink.text(), "[!] Unknown option: `--x`\n\n");
    }

    #[test]
    fn test_auto_is_plain_for_plain_writers() {
        let (term, _) = terminal(ColorMode::Auto, 80);
        assert!(!term.is_styled());
    }

    #[test]
    fn test_always_emits_ansi() {
        let (mut term, sink) = terminal(ColorMode::Always, 80);
        term.line(&Line::styled("boom", Style::Error)).unwrap();
        let text = sink.text();
        assert!(text.contains("\u{1b}["));
        assert!(text.contains("boom"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_hard_wrap_reemits_indent() {
        let (mut term, sink) = terminal(ColorMode::Never, 10);
        let line = Line::new().indent("  ").push("abcdefghijklmnop", Style::Plain);
        term.line(&line).unwrap();
        assert_eq!(sink.text(), "abcdefghij\n  klmnop\n");
    }

    #[test]
    fn test_embedded_newline_uses_indent() {
        let (mut term, sink) = terminal(ColorMode::Never, 80);
        let line = Line::new()
            .indent("      ")
            .push("      ", Style::Plain)
            .push("one\ntwo", Style::Plain);
        term.line(&line).unwrap();
        assert_eq!(sink.text(), "      one\n      two\n");
    }

    #[test]
    fn test_wide_characters_count_two_columns() {
        let (mut term, sink) = terminal(ColorMode::Never, 4);
        term.line(&Line::styled("日本語", Style::Plain)).unwrap();
        assert_eq!(sink.text(), "日本\n語\n");
    }

    #[test]
    fn test_config_defaults_from_empty_document() {
        let config: TerminalConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, TerminalConfig::default());
        assert_eq!(config.color, ColorMode::Auto);

        let json = serde_json::to_string(&TerminalConfig {
            color: ColorMode::Always,
            width: Some(100),
        })
        .unwrap();
        assert_eq!(json, r#"{"color":"always","width":100}"#);
    }
}
