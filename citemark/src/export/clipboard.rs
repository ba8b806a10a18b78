use std::io::Write;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

/// Why a clipboard write did not happen.
#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard access denied by the host")]
    Denied,
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("clipboard write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A platform clipboard that accepts plain text.
pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Clipboard kept in memory; the last written text is readable back.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Option<String>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        MemoryClipboard::default()
    }

    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.contents = Some(text.to_string());
        Ok(())
    }
}

/// Clipboard that forwards text to any writer (stdout, a file, a pipe).
#[derive(Debug)]
pub struct WriterClipboard<W: Write> {
    writer: W,
}

impl<W: Write> WriterClipboard<W> {
    pub fn new(writer: W) -> Self {
        WriterClipboard { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Clipboard for WriterClipboard<W> {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.writer.write_all(text.as_bytes())?;
        if !text.ends_with('\n') {
            self.writer.write_all(b"\n")?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

/// The "Copy CSV" affordance: writes to a clipboard and shows a transient
/// "Copied" acknowledgement that reverts after a fixed delay.
///
/// Time is passed in by the caller, so the state is a pure function of the
/// last successful copy and `now`.
#[derive(Debug, Clone)]
pub struct CopyAction {
    feedback: Duration,
    copied_at: Option<Instant>,
}

impl CopyAction {
    pub fn new(feedback: Duration) -> Self {
        CopyAction {
            feedback,
            copied_at: None,
        }
    }

    /// Write `text` to `clipboard`. Failures are logged and swallowed; they
    /// leave the acknowledgement state untouched. Returns whether the write
    /// succeeded.
    pub fn copy(&mut self, clipboard: &mut dyn Clipboard, text: &str, now: Instant) -> bool {
        match clipboard.write_text(text) {
            Ok(()) => {
                debug!(bytes = text.len(), "copied table to clipboard");
                self.copied_at = Some(now);
                true
            }
            Err(err) => {
                warn!(error = %err, "clipboard write failed");
                false
            }
        }
    }

    pub fn is_copied(&self, now: Instant) -> bool {
        self.copied_at
            .is_some_and(|at| now.saturating_duration_since(at) < self.feedback)
    }

    pub fn label(&self, now: Instant) -> &'static str {
        if self.is_copied(now) {
            "Copied"
        } else {
            "Copy CSV"
        }
    }
}
