//! Clipboard access for "copy code".
//!
//! Failures are reported once as a notice and never retried.

use thiserror::Error;

/// Clipboard failures.
#[derive(Debug, Error)]
pub enum ClipboardError {
    /// No clipboard could be opened.
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
    /// Writing to the clipboard failed.
    #[error("clipboard write failed: {0}")]
    Write(String),
}

/// Something that accepts copied text.
pub trait ClipboardSink {
    /// Replace the clipboard contents.
    ///
    /// # Errors
    ///
    /// Returns a [`ClipboardError`] if the text could not be stored.
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// In-memory clipboard, for tests and headless runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    contents: Option<String>,
}

impl MemoryClipboard {
    /// Create an empty clipboard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last copied text.
    #[must_use]
    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }
}

impl ClipboardSink for MemoryClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.contents = Some(text.to_string());
        Ok(())
    }
}

/// Clipboard that always fails; used when no system clipboard is built in.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledClipboard;

impl ClipboardSink for DisabledClipboard {
    fn set_text(&mut self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::Unavailable(
            "built without the `clipboard` feature".into(),
        ))
    }
}

/// The system clipboard via `arboard`.
#[cfg(feature = "clipboard")]
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

#[cfg(feature = "clipboard")]
impl SystemClipboard {
    /// Open the system clipboard.
    ///
    /// # Errors
    ///
    /// Returns [`ClipboardError::Unavailable`] if no clipboard is reachable
    /// (for example on a headless machine).
    pub fn new() -> Result<Self, ClipboardError> {
        let inner =
            arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        Ok(Self { inner })
    }
}

#[cfg(feature = "clipboard")]
impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.inner
            .set_text(text.to_string())
            .map_err(|e| ClipboardError::Write(e.to_string()))
    }
}

/// The best clipboard this build can offer.
#[must_use]
pub fn default_clipboard() -> Box<dyn ClipboardSink> {
    #[cfg(feature = "clipboard")]
    {
        match SystemClipboard::new() {
            Ok(clipboard) => return Box::new(clipboard),
            Err(e) => tracing::warn!("{e}"),
        }
    }
    Box::new(DisabledClipboard)
}
