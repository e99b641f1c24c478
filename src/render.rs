//! Output rendering for the chat loop.
//!
//! This module provides the [`Renderer`] trait and a plain-text
//! implementation that colors assistant responses with ANSI escape codes,
//! rotating through a per-model list of shades.

use std::collections::HashMap;
use std::io::{self, Stdout, Write};

use crate::observability::RENDER_RESPONSES;
use crate::selector::{DEFAULT_SHADE, ModelTable};
use crate::types::Model;

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Wraps `text` in the SGR color `code`.
pub fn color_text(text: &str, code: u8) -> String {
    format!("\x1b[{code}m{text}{ANSI_RESET}")
}

/////////////////////////////////////////// ShadeRotation //////////////////////////////////////////

/// Round-robin position in each model's shade list.
///
/// Counters are independent per model and start at zero; the `n`th response
/// of a model with `k` shades uses shade `n mod k`.
#[derive(Debug, Clone, Default)]
pub struct ShadeRotation {
    shades: HashMap<Model, Vec<u8>>,
    counts: HashMap<Model, usize>,
}

impl ShadeRotation {
    /// Creates a rotation over the given shade lists.
    pub fn new(shades: HashMap<Model, Vec<u8>>) -> Self {
        Self {
            shades,
            counts: HashMap::new(),
        }
    }

    /// Creates a rotation over the shades configured in `table`.
    pub fn from_table(table: &ModelTable) -> Self {
        Self::new(table.shade_table())
    }

    /// Returns the shade for the next response of `model` and advances its
    /// counter.  Models without shades always get [`DEFAULT_SHADE`].
    pub fn next_shade(&mut self, model: &Model) -> u8 {
        let count = self.counts.entry(model.clone()).or_insert(0);
        let shade = match self.shades.get(model) {
            Some(shades) if !shades.is_empty() => shades[*count % shades.len()],
            _ => DEFAULT_SHADE,
        };
        *count += 1;
        shade
    }

    /// Number of responses rendered so far for `model`.
    pub fn count(&self, model: &Model) -> usize {
        self.counts.get(model).copied().unwrap_or(0)
    }
}

///////////////////////////////////////////// Renderer /////////////////////////////////////////////

/// Trait for rendering chat output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
/// - Capturing output in tests
pub trait Renderer: Send {
    /// Print an assistant response produced by `model`.
    fn print_response(&mut self, model: &Model, text: &str);

    /// Announce a generated image.
    fn print_image(&mut self, url: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);
}

/// Plain text renderer with optional ANSI styling.
///
/// Writes to stdout by default; [`PlainTextRenderer::with_writer`] renders
/// into any other sink.
pub struct PlainTextRenderer<W: Write + Send = Stdout> {
    out: W,
    use_color: bool,
    rotation: ShadeRotation,
}

impl PlainTextRenderer<Stdout> {
    /// Creates a new PlainTextRenderer on stdout with ANSI colors enabled.
    pub fn new(table: &ModelTable) -> Self {
        Self::with_color(table, true)
    }

    /// Creates a new PlainTextRenderer on stdout with specified color setting.
    pub fn with_color(table: &ModelTable, use_color: bool) -> Self {
        Self::with_writer(io::stdout(), table, use_color)
    }
}

impl<W: Write + Send> PlainTextRenderer<W> {
    /// Creates a renderer writing to `out`.
    pub fn with_writer(out: W, table: &ModelTable, use_color: bool) -> Self {
        Self {
            out,
            use_color,
            rotation: ShadeRotation::from_table(table),
        }
    }

    /// The underlying sink.
    pub fn writer(&self) -> &W {
        &self.out
    }

    /// Consumes the renderer, returning the underlying sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, line: &str) {
        let _ = writeln!(self.out, "{line}");
        let _ = self.out.flush();
    }
}

impl<W: Write + Send> Renderer for PlainTextRenderer<W> {
    fn print_response(&mut self, model: &Model, text: &str) {
        let shade = self.rotation.next_shade(model);
        let header = format!("\nResponse from {model}:");
        if self.use_color {
            self.write_line(&color_text(&header, shade));
            self.write_line(&color_text(text, shade));
        } else {
            self.write_line(&header);
            self.write_line(text);
        }
        RENDER_RESPONSES.click();
    }

    fn print_image(&mut self, url: &str) {
        self.write_line(&format!("Image generated: {url}"));
    }

    fn print_error(&mut self, error: &str) {
        if self.use_color {
            self.write_line(&format!("{ANSI_RED}{error}{ANSI_RESET}"));
        } else {
            self.write_line(error);
        }
    }

    fn print_info(&mut self, info: &str) {
        self.write_line(info);
    }
}
