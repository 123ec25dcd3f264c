//! File intake: the drop/select targets of the conversion form.
//!
//! A [`FileIntake`] turns "the user dropped or picked these files" into a
//! typed [`FilesSelected`] event. It holds no selection state of its own;
//! the [`crate::session::ConversionSession`] owns both selections and
//! consumes the event through [`crate::session::ConversionSession::apply`].
//!
//! ```text
//! drop / pick ──▶ FileIntake::select ──▶ FilesSelected ──▶ session.apply
//!                        │
//!                        └──▶ SelectionCallback (optional)
//! ```
//!
//! The accept filter is advisory, the way a browser `accept` attribute is:
//! files that do not match are logged and passed through. Whether a file is
//! acceptable for its slot is decided by the session.

use crate::file::FileRef;
use std::sync::Arc;
use tracing::{debug, warn};

/// Which form field a selection belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntakeSlot {
    /// The required article PDF.
    Pdf,
    /// The optional figure images.
    Figures,
}

/// Whether a target keeps one file or accumulates many.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Each selection replaces the previous one.
    Single,
    /// Each selection is appended to the list.
    Multiple,
}

/// Typed "files selected" event emitted by a [`FileIntake`].
///
/// `files` holds only the files added by this selection, never earlier ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesSelected {
    pub slot: IntakeSlot,
    pub files: Vec<FileRef>,
}

/// Receives every [`FilesSelected`] event a [`FileIntake`] emits.
///
/// Useful for UIs that echo the running figure list as files are added.
pub trait SelectionCallback: Send + Sync {
    fn on_files_selected(&self, event: &FilesSelected);
}

/// Accept filter in the style of an HTML `accept` attribute.
///
/// Entries are either extensions (`.pdf`) or MIME patterns
/// (`application/pdf`, `image/*`). An empty filter accepts everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptFilter {
    entries: Vec<String>,
}

impl AcceptFilter {
    /// Parse a comma-separated `accept` string such as `".pdf,application/pdf"`.
    pub fn parse(accept: &str) -> Self {
        Self {
            entries: accept
                .split(',')
                .map(|e| e.trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Filter for the PDF slot.
    pub fn pdf() -> Self {
        Self::parse(".pdf,application/pdf")
    }

    /// Filter for the figures slot.
    pub fn figures() -> Self {
        Self::parse("image/*,.png,.jpg,.jpeg,.tif,.tiff,.gif")
    }

    pub fn matches(&self, file: &FileRef) -> bool {
        if self.entries.is_empty() {
            return true;
        }
        let ext = file.extension();
        let content_type = file.content_type().to_lowercase();
        self.entries.iter().any(|entry| {
            if let Some(wanted) = entry.strip_prefix('.') {
                ext.as_deref() == Some(wanted)
            } else if let Some(major) = entry.strip_suffix("/*") {
                content_type
                    .split_once('/')
                    .is_some_and(|(m, _)| m == major)
            } else {
                *entry == content_type
            }
        })
    }
}

/// A drop/select target.
pub struct FileIntake {
    slot: IntakeSlot,
    accept: AcceptFilter,
    mode: SelectionMode,
    callback: Option<Arc<dyn SelectionCallback>>,
}

impl FileIntake {
    pub fn new(slot: IntakeSlot, accept: AcceptFilter, mode: SelectionMode) -> Self {
        Self {
            slot,
            accept,
            mode,
            callback: None,
        }
    }

    /// The single-file PDF target of the conversion form.
    pub fn pdf() -> Self {
        Self::new(IntakeSlot::Pdf, AcceptFilter::pdf(), SelectionMode::Single)
    }

    /// The multi-file figures target of the conversion form.
    pub fn figures() -> Self {
        Self::new(
            IntakeSlot::Figures,
            AcceptFilter::figures(),
            SelectionMode::Multiple,
        )
    }

    pub fn with_callback(mut self, callback: Arc<dyn SelectionCallback>) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn slot(&self) -> IntakeSlot {
        self.slot
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn accept(&self) -> &AcceptFilter {
        &self.accept
    }

    /// Handle a drop or manual pick.
    ///
    /// Returns `None` when nothing was selected. In single mode only the
    /// first file is kept.
    pub fn select(&self, files: Vec<FileRef>) -> Option<FilesSelected> {
        let files: Vec<FileRef> = match self.mode {
            SelectionMode::Single => files.into_iter().take(1).collect(),
            SelectionMode::Multiple => files,
        };
        if files.is_empty() {
            return None;
        }

        for f in files.iter().filter(|f| !self.accept.matches(f)) {
            warn!(
                "{:?}: '{}' ({}) does not match the accept filter",
                self.slot,
                f.name(),
                f.content_type()
            );
        }
        debug!("{:?}: {} file(s) selected", self.slot, files.len());

        let event = FilesSelected {
            slot: self.slot,
            files,
        };
        if let Some(ref cb) = self.callback {
            cb.on_files_selected(&event);
        }
        Some(event)
    }
}

/// The files currently held by one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadSelection {
    Single(Option<FileRef>),
    Multiple(Vec<FileRef>),
}

impl UploadSelection {
    pub fn new(mode: SelectionMode) -> Self {
        match mode {
            SelectionMode::Single => UploadSelection::Single(None),
            SelectionMode::Multiple => UploadSelection::Multiple(Vec::new()),
        }
    }

    /// Replace the selection with `file` (single) or with just `file` (multiple).
    pub fn replace(&mut self, file: FileRef) {
        match self {
            UploadSelection::Single(slot) => *slot = Some(file),
            UploadSelection::Multiple(list) => {
                list.clear();
                list.push(file);
            }
        }
    }

    /// Append `files` in order. A single selection keeps the last one.
    pub fn append(&mut self, files: impl IntoIterator<Item = FileRef>) {
        match self {
            UploadSelection::Single(slot) => {
                if let Some(last) = files.into_iter().last() {
                    *slot = Some(last);
                }
            }
            UploadSelection::Multiple(list) => list.extend(files),
        }
    }

    pub fn clear(&mut self) {
        match self {
            UploadSelection::Single(slot) => *slot = None,
            UploadSelection::Multiple(list) => list.clear(),
        }
    }

    pub fn files(&self) -> &[FileRef] {
        match self {
            UploadSelection::Single(slot) => slot.as_slice(),
            UploadSelection::Multiple(list) => list,
        }
    }

    pub fn first(&self) -> Option<&FileRef> {
        self.files().first()
    }

    pub fn is_empty(&self) -> bool {
        self.files().is_empty()
    }
}
