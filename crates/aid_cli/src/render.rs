use std::io;

use aid_agent::{Error, Update};
use aid_tools::first_line;
use crossterm::style::Stylize as _;

/// Turns the updates of one turn into terminal output.
#[derive(Debug)]
pub struct Renderer<W> {
    out: W,
    color: bool,

    /// Assistant text was written since the last tool line.
    has_text: bool,

    /// A tool line was written since the last assistant text.
    has_tool: bool,
}

impl<W: io::Write> Renderer<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out,
            color,
            has_text: false,
            has_tool: false,
        }
    }

    pub fn render(&mut self, update: &Update) -> io::Result<()> {
        match update {
            Update::TextDelta(text) => self.text(text),
            Update::ToolStarted { label, .. } => {
                self.separate_tool()?;
                let line = format!("{label}…");
                self.dim(&line)?;
                self.has_tool = true;
                self.has_text = false;
                Ok(())
            }
            Update::ToolStatus { status, .. } => {
                write!(self.out, "\n  ")?;
                self.dim(status)
            }
            Update::ToolFinished {
                result, duplicate, ..
            } => {
                writeln!(self.out)?;
                match result.error_message() {
                    Some(error) => write!(self.out, "❌ {}: {}", result.label(), first_line(error))?,
                    None => write!(self.out, "✅ {}", result.label())?,
                }

                if *duplicate {
                    self.dim(" (repeated call)")?;
                }

                Ok(())
            }
            Update::Error(error) => {
                self.separate_tool()?;
                match error {
                    Error::Llm(aid_llm::Error::Cancelled) => self.dim("Cancelled."),
                    error => write!(self.out, "❌ {error}"),
                }
            }
        }
    }

    /// Finish the turn's output.
    pub fn finish(mut self) -> io::Result<W> {
        writeln!(self.out)?;
        Ok(self.out)
    }

    fn text(&mut self, text: &str) -> io::Result<()> {
        if self.has_tool {
            write!(self.out, "\n\n")?;
            self.has_tool = false;
        }

        // Models like to open with a blank line.
        let text = if self.has_text { text } else { text.trim_start() };
        if text.is_empty() {
            return Ok(());
        }

        self.has_text = true;
        write!(self.out, "{text}")
    }

    fn separate_tool(&mut self) -> io::Result<()> {
        if self.has_tool {
            writeln!(self.out)
        } else if self.has_text {
            write!(self.out, "\n\n")
        } else {
            Ok(())
        }
    }

    fn dim(&mut self, text: &str) -> io::Result<()> {
        if self.color {
            write!(self.out, "{}", text.dim())
        } else {
            write!(self.out, "{text}")
        }
    }
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
