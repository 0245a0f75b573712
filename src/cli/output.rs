//! Colored terminal output for signing runs.
//!
//! Each line is assembled in one buffer (glyph, body, reset) before it is
//! printed, so env_logger output on stderr never splits a line.

use crate::certificate::CleanupOutcome;
use crate::tools::{ToolInvocation, ToolKind};
use std::io::Write;
use std::path::Path;
use termcolor::{BufferWriter, Color, ColorChoice, ColorSpec, WriteColor};

/// How a line is decorated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Info,
    Success,
    Warning,
    Failure,
    Detail,
}

impl Tone {
    fn glyph(self) -> &'static str {
        match self {
            Tone::Info => "ℹ",
            Tone::Success => "✓",
            Tone::Warning => "⚠",
            Tone::Failure => "✗",
            Tone::Detail => "→",
        }
    }

    fn color(self) -> Color {
        match self {
            Tone::Info => Color::Cyan,
            Tone::Success => Color::Green,
            Tone::Warning => Color::Yellow,
            Tone::Failure => Color::Red,
            Tone::Detail => Color::Blue,
        }
    }

    /// Warnings and failures color the message too, not only the glyph
    fn tints_body(self) -> bool {
        matches!(self, Tone::Warning | Tone::Failure)
    }
}

/// Color a tool name is shown in, so the two signing passes stand apart
fn tool_color(kind: ToolKind) -> Color {
    match kind {
        ToolKind::SignTool => Color::Magenta,
        ToolKind::Mage => Color::Cyan,
        ToolKind::OpenSsl => Color::Yellow,
        ToolKind::CertUtil => Color::Green,
    }
}

/// Digest label for the pass a tool belongs to
fn pass_digest(kind: ToolKind) -> Option<&'static str> {
    match kind {
        ToolKind::SignTool => Some("SHA-256"),
        ToolKind::Mage => Some("SHA-1"),
        ToolKind::OpenSsl | ToolKind::CertUtil => None,
    }
}

/// Output manager for the signing CLI
#[derive(Debug)]
pub struct OutputManager {
    stdout: BufferWriter,
    stderr: BufferWriter,
    verbose: bool,
    quiet: bool,
}

impl OutputManager {
    /// Create a new output manager
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            stdout: BufferWriter::stdout(ColorChoice::Auto),
            stderr: BufferWriter::stderr(ColorChoice::Auto),
            verbose,
            quiet,
        }
    }

    fn toned(&self, writer: &BufferWriter, tone: Tone, message: &str) -> std::io::Result<()> {
        let mut buffer = writer.buffer();
        buffer.set_color(ColorSpec::new().set_fg(Some(tone.color())).set_bold(true))?;
        write!(&mut buffer, "{}", tone.glyph())?;
        buffer.reset()?;
        if tone.tints_body() {
            buffer.set_color(ColorSpec::new().set_fg(Some(tone.color())))?;
        }
        writeln!(&mut buffer, " {}", message)?;
        buffer.reset()?;
        writer.print(&buffer)
    }

    fn plain(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let mut buffer = self.stdout.buffer();
        writeln!(&mut buffer, "{}", message)?;
        self.stdout.print(&buffer)
    }

    /// Print an info message (normal output)
    pub fn info(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.toned(&self.stdout, Tone::Info, message)
    }

    /// Print a success message
    pub fn success(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.toned(&self.stdout, Tone::Success, message)
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.toned(&self.stdout, Tone::Warning, message)
    }

    /// Print an error message to stderr (always shown)
    pub fn error(&self, message: &str) {
        if self.toned(&self.stderr, Tone::Failure, message).is_err() {
            eprintln!("✗ {}", message);
        }
    }

    /// Print a message only in verbose mode
    pub fn verbose(&self, message: &str) -> std::io::Result<()> {
        if !self.verbose || self.quiet {
            return Ok(());
        }
        self.toned(&self.stdout, Tone::Detail, message)
    }

    /// Print a section header
    pub fn section(&self, title: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let mut buffer = self.stdout.buffer();
        writeln!(&mut buffer)?;
        buffer.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
        writeln!(&mut buffer, "═══ {} ═══", title)?;
        buffer.reset()?;
        self.stdout.print(&buffer)
    }

    /// Print indented text (for sub-items)
    pub fn indent(&self, message: &str) -> std::io::Result<()> {
        self.plain(&format!("    {}", message))
    }

    /// Print a plain message (respects quiet mode)
    pub fn println(&self, message: &str) -> std::io::Result<()> {
        self.plain(message)
    }

    /// One numbered step of a dry-run plan: the tool name in its pass color,
    /// then the redacted command line
    pub fn tool_step(&self, number: usize, invocation: &ToolInvocation) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let mut buffer = self.stdout.buffer();
        write!(&mut buffer, "  {:>2}. ", number)?;
        write_tool_label(&mut buffer, invocation.kind())?;
        writeln!(&mut buffer, " {}", invocation)?;
        self.stdout.print(&buffer)
    }

    /// Summary of one signing pass: tool, digest, then each signed file
    pub fn signed_pass<P: AsRef<Path>>(&self, tool: ToolKind, files: &[P]) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let mut buffer = self.stdout.buffer();
        write_tool_label(&mut buffer, tool)?;
        writeln!(&mut buffer, " {}", pass_summary(tool, files.len()))?;
        for file in files {
            writeln!(&mut buffer, "    {}", file.as_ref().display())?;
        }
        self.stdout.print(&buffer)
    }

    /// Outcome of removing an imported certificate from the store
    pub fn cleanup(&self, outcome: &CleanupOutcome) -> std::io::Result<()> {
        match outcome {
            CleanupOutcome::Skipped => Ok(()),
            CleanupOutcome::Removed => self.verbose("Imported certificate removed from the store"),
            CleanupOutcome::Failed(reason) => self.warn(&format!(
                "Imported certificate may still be in the personal store: {}",
                reason
            )),
        }
    }

    /// Recovery suggestions after a failure (always shown, on stderr)
    pub fn suggestions(&self, suggestions: &[String]) {
        if suggestions.is_empty() {
            return;
        }
        let mut lines = String::from("\n💡 Recovery suggestions:\n");
        for suggestion in suggestions {
            lines.push_str(&format!("    • {}\n", suggestion));
        }
        let mut buffer = self.stderr.buffer();
        if write!(&mut buffer, "{}", lines).is_err() || self.stderr.print(&buffer).is_err() {
            eprint!("{}", lines);
        }
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }
}

fn write_tool_label<W: WriteColor>(out: &mut W, kind: ToolKind) -> std::io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(tool_color(kind))).set_bold(true))?;
    write!(out, "[{}]", kind)?;
    out.reset()
}

fn pass_summary(tool: ToolKind, count: usize) -> String {
    match pass_digest(tool) {
        Some(digest) => format!("{} signed {} file(s)", digest, count),
        None => format!("ran {} time(s)", count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_summary_names_the_digest() {
        assert_eq!(pass_summary(ToolKind::SignTool, 2), "SHA-256 signed 2 file(s)");
        assert_eq!(pass_summary(ToolKind::Mage, 3), "SHA-1 signed 3 file(s)");
        assert_eq!(pass_summary(ToolKind::CertUtil, 1), "ran 1 time(s)");
    }

    #[test]
    fn test_only_warnings_and_failures_tint_the_message() {
        assert!(Tone::Warning.tints_body());
        assert!(Tone::Failure.tints_body());
        assert!(!Tone::Success.tints_body());
        assert!(!Tone::Detail.tints_body());
    }

    #[test]
    fn test_quiet_suppresses_normal_output() {
        let output = OutputManager::new(true, true);
        assert!(output.is_quiet());
        output.info("hidden").expect("no-op");
        output.signed_pass(ToolKind::SignTool, &[Path::new("setup.exe")]).expect("no-op");
        output.cleanup(&CleanupOutcome::Removed).expect("no-op");
    }
}
