//! The studio host loop.
//!
//! Owns a [`CanvasWorkspace`] and drives everything that happens outside of
//! it: loading pages from disk, running variant generations as spawned tasks,
//! applying their results in arrival order, copying code and writing themed
//! output.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use canvas_core::{CanvasError, CanvasWorkspace, Notice, NoticeLevel};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::clipboard::{ClipboardSink, DisabledClipboard};
use crate::generator::{GenerationEvent, PartialSink, VariantGenerator};

/// Extension of page files.
pub const PAGE_EXTENSION: &str = "html";

/// Errors from studio operations.
#[derive(Debug, Error)]
pub enum StudioError {
    /// Filesystem access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A canvas operation was rejected.
    #[error(transparent)]
    Canvas(#[from] CanvasError),
}

/// Result type for studio operations.
pub type StudioResult<T> = Result<T, StudioError>;

/// Host around a canvas workspace.
pub struct Studio {
    workspace: CanvasWorkspace,
    generator: Arc<dyn VariantGenerator>,
    events_tx: mpsc::UnboundedSender<GenerationEvent>,
    events_rx: mpsc::UnboundedReceiver<GenerationEvent>,
    in_flight: HashSet<String>,
    clipboard: Box<dyn ClipboardSink>,
}

impl fmt::Debug for Studio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Studio")
            .field("workspace", &self.workspace)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

impl Studio {
    /// Create a studio around `workspace` using `generator` for variants.
    #[must_use]
    pub fn new(workspace: CanvasWorkspace, generator: Arc<dyn VariantGenerator>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            workspace,
            generator,
            events_tx,
            events_rx,
            in_flight: HashSet::new(),
            clipboard: Box::new(DisabledClipboard),
        }
    }

    /// Use `clipboard` for copy operations.
    #[must_use]
    pub fn with_clipboard(mut self, clipboard: Box<dyn ClipboardSink>) -> Self {
        self.clipboard = clipboard;
        self
    }

    /// The workspace.
    #[must_use]
    pub fn workspace(&self) -> &CanvasWorkspace {
        &self.workspace
    }

    /// The workspace, mutably.
    pub fn workspace_mut(&mut self) -> &mut CanvasWorkspace {
        &mut self.workspace
    }

    /// Number of generations still running.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    // -----------------------------------------------------------------------
    // Pages on disk
    // -----------------------------------------------------------------------

    /// Load every `*.html` file in `dir` as a page, in file name order, and
    /// mount a surface for each. The page id is the file stem.
    ///
    /// Files whose stem is not a valid page id are skipped with a warning.
    /// Loading is not an undoable step.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Io`] if the directory or a file cannot be read.
    pub fn load_pages(&mut self, dir: &Path) -> StudioResult<Vec<String>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == PAGE_EXTENSION) {
                files.push(path);
            }
        }
        files.sort();

        let mut loaded = Vec::new();
        for path in files {
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let markup = fs::read_to_string(&path)?;
            match self.workspace.insert_page(id, markup) {
                Ok(()) => loaded.push(id.to_string()),
                Err(e) => {
                    tracing::warn!("Skipping {}: {e}", path.display());
                    self.workspace
                        .push_notice(Notice::warning(format!("Skipped {}: {e}", path.display())));
                }
            }
        }
        self.workspace.mount_all();
        self.workspace.clear_history();
        tracing::info!("Loaded {} pages from {}", loaded.len(), dir.display());
        Ok(loaded)
    }

    /// Write each page's themed markup to `dir/{id}.html`.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Io`] if the directory or a file cannot be
    /// written.
    pub fn write_output(&self, dir: &Path) -> StudioResult<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::new();
        for id in self.workspace.pages().list() {
            let themed = self.workspace.themed_markup(&id)?;
            let path = dir.join(format!("{id}.{PAGE_EXTENSION}"));
            fs::write(&path, themed)?;
            tracing::debug!("Wrote {}", path.display());
            written.push(path);
        }
        tracing::info!("Wrote {} pages to {}", written.len(), dir.display());
        Ok(written)
    }

    // -----------------------------------------------------------------------
    // Variant generation
    // -----------------------------------------------------------------------

    /// Start generating a variant of `page_id` in the background.
    ///
    /// The page is flagged generating immediately; the result is applied by
    /// [`Self::process_events`] or [`Self::run_until_idle`].
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Canvas`] if the page is unknown or already
    /// generating.
    pub fn request_variant(&mut self, page_id: &str, variant: Option<&str>) -> StudioResult<()> {
        let request = self.workspace.begin_generation(page_id, variant)?;
        self.in_flight.insert(page_id.to_string());

        let generator = Arc::clone(&self.generator);
        let tx = self.events_tx.clone();
        let page_id = page_id.to_string();
        tokio::spawn(async move {
            let partials = PartialSink::new(page_id.clone(), tx.clone());
            let result = generator.generate_streaming(&request, partials).await;
            if tx.send(GenerationEvent::Finished { page_id, result }).is_err() {
                tracing::debug!("Studio dropped before generation finished");
            }
        });
        Ok(())
    }

    /// Apply every generation event that has already arrived. Returns how
    /// many were applied.
    pub fn process_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply_event(event);
            applied += 1;
        }
        applied
    }

    /// Wait until every running generation has finished, applying events as
    /// they arrive.
    pub async fn run_until_idle(&mut self) {
        while !self.in_flight.is_empty() {
            let Some(event) = self.events_rx.recv().await else {
                break;
            };
            self.apply_event(event);
        }
        self.process_events();
    }

    /// Apply one generation event to the workspace.
    pub fn apply_event(&mut self, event: GenerationEvent) {
        match event {
            GenerationEvent::Partial { page_id, markup } => {
                tracing::debug!("Partial markup for {page_id} ({} bytes)", markup.len());
                if let Err(e) = self.workspace.apply_partial_generation(&page_id, &markup) {
                    tracing::warn!("Dropped partial markup: {e}");
                }
            }
            GenerationEvent::Finished { page_id, result } => {
                self.in_flight.remove(&page_id);
                if let Err(e) = self.workspace.complete_generation(&page_id, result) {
                    tracing::warn!("Dropped generation result: {e}");
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Clipboard and notices
    // -----------------------------------------------------------------------

    /// Copy one page's markup, or every page's, to the clipboard. A failure
    /// becomes a notice and is not retried. Returns whether the copy
    /// happened.
    pub fn copy_code(&mut self, page_id: Option<&str>) -> bool {
        let text = match self.workspace.copy_code(page_id) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Copy failed: {e}");
                self.workspace.push_notice(Notice::warning(e.to_string()));
                return false;
            }
        };
        match self.clipboard.set_text(&text) {
            Ok(()) => {
                let what = page_id.unwrap_or("all pages");
                tracing::info!("Copied {what} ({} bytes)", text.len());
                self.workspace
                    .push_notice(Notice::info(format!("Copied {what} to the clipboard")));
                true
            }
            Err(e) => {
                tracing::warn!("Copy failed: {e}");
                self.workspace
                    .push_notice(Notice::warning(format!("Could not copy code: {e}")));
                false
            }
        }
    }

    /// Take pending notices, logging each one.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        let notices = self.workspace.drain_notices();
        for notice in &notices {
            match notice.level {
                NoticeLevel::Info => tracing::info!("{}", notice.message),
                NoticeLevel::Warning => tracing::warn!("{}", notice.message),
                NoticeLevel::Error => tracing::error!("{}", notice.message),
            }
        }
        notices
    }
}
