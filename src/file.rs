//! In-memory file references.
//!
//! A [`FileRef`] is what the intake hands to the session and what the
//! session uploads: a name, a best-guess content type and the bytes. Files
//! are read fully into memory up front, so a file that disappears between
//! selection and submit cannot break an in-flight upload.

use crate::error::ConvertError;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// A selected file held in memory.
///
/// Cloning is cheap: the byte buffer is shared.
#[derive(Clone, PartialEq, Eq)]
pub struct FileRef {
    name: String,
    content_type: String,
    data: Arc<[u8]>,
}

impl FileRef {
    /// Build a file reference from bytes, guessing the content type from `name`.
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        let name = name.into();
        let data: Vec<u8> = data.into();
        let content_type = guess_content_type(&name).to_string();
        Self {
            name,
            content_type,
            data: Arc::from(data),
        }
    }

    /// Override the guessed content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Read a local file into memory.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ConvertError> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConvertError::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => ConvertError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => ConvertError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        debug!("Loaded {} ({} bytes)", path.display(), data.len());
        Ok(Self::from_bytes(name, data))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Lower-cased extension of the file name, without the dot.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }

    /// Whether this file can go into the PDF slot.
    ///
    /// The name or content type must say PDF, and when there are enough
    /// bytes to tell, the content must start with `%PDF`.
    pub fn looks_like_pdf(&self) -> bool {
        let declared = self.extension().as_deref() == Some("pdf")
            || self.content_type.eq_ignore_ascii_case(PDF_CONTENT_TYPE);
        let magic_ok = self.data.len() < PDF_MAGIC.len() || self.data.starts_with(PDF_MAGIC);
        declared && magic_ok
    }

    /// File name of the archive the service returns for this PDF:
    /// the extension replaced by `.zip`.
    pub fn archive_name(&self) -> String {
        let stem = Path::new(&self.name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "converted".to_string());
        format!("{stem}.zip")
    }
}

impl fmt::Debug for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileRef")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Content type for the file kinds the service deals with.
pub fn guess_content_type(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase());
    match ext.as_deref() {
        Some("pdf") => PDF_CONTENT_TYPE,
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}
