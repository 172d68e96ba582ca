//! Output primitives shared by the engine and the usage layout.
//!
//! The engine never formats bytes itself: it builds [`Line`]s of styled
//! [`Span`]s and hands them to a [`Renderer`]. [`Terminal`](crate::Terminal)
//! draws them with colours and wrapping, [`Recorder`] keeps the plain text.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

/// Semantic style hint attached to a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Style {
    #[default]
    Plain,
    Error,
    Heading,
    Command,
    Input,
    Option,
    Code,
    Emphasis,
    Strong,
}

/// A run of text sharing one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: Style,
}

impl Span {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Style::Plain)
    }
}

/// One logical output line.
///
/// `indent` is the hanging indent written after every embedded `\n` and,
/// for renderers that wrap, after every break.
///
/// # Examples
///
/// ```
/// use kmnd_core::{Line, Style};
///
/// let line = Line::new()
///     .indent("  ")
///     .push("first\nsecond", Style::Plain);
/// assert_eq!(line.plain_text(), "first\n  second");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Line {
    pub spans: Vec<Span>,
    pub indent: String,
}

impl Line {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty line.
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn styled(text: impl Into<String>, style: Style) -> Self {
        Self::new().push(text, style)
    }

    pub fn indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    pub fn push(mut self, text: impl Into<String>, style: Style) -> Self {
        self.spans.push(Span::new(text, style));
        self
    }

    pub fn extend(mut self, spans: impl IntoIterator<Item = Span>) -> Self {
        self.spans.extend(spans);
        self
    }

    /// The unstyled text with the hanging indent applied after newlines.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for span in &self.spans {
            for (i, part) in span.text.split('\n').enumerate() {
                if i > 0 {
                    out.push('\n');
                    out.push_str(&self.indent);
                }
                out.push_str(part);
            }
        }
        out
    }
}

/// Sink for rendered lines.
pub trait Renderer {
    /// Writes one line followed by a line break.
    fn line(&mut self, line: &Line) -> io::Result<()>;

    fn lines(&mut self, lines: &[Line]) -> io::Result<()> {
        for line in lines {
            self.line(line)?;
        }
        Ok(())
    }
}

/// In-memory renderer keeping the plain text of every line.
///
/// Clones share the same buffer, so a test can hand one clone to a
/// [`Grammar`](crate::Grammar) and read the output through another.
///
/// # Examples
///
/// ```
/// use kmnd_core::{Line, Recorder, Renderer, Style};
///
/// let recorder = Recorder::new();
/// let mut sink = recorder.clone();
/// sink.line(&Line::styled("hello", Style::Strong)).unwrap();
/// sink.line(&Line::blank()).unwrap();
/// assert_eq!(recorder.contents(), "hello\n\n");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    lines: Rc<RefCell<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded lines without their trailing line breaks.
    pub fn recorded(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    /// Everything recorded so far, one `\n` after each line.
    pub fn contents(&self) -> String {
        self.lines
            .borrow()
            .iter()
            .fold(String::new(), |mut out, line| {
                out.push_str(line);
                out.push('\n');
                out
            })
    }

    pub fn clear(&self) {
        self.lines.borrow_mut().clear();
    }
}

impl Renderer for Recorder {
    fn line(&mut self, line: &Line) -> io::Result<()> {
        self.lines.borrow_mut().push(line.plain_text());
        Ok(())
    }
}
