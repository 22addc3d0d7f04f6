//! Upload surface.
//!
//! Files reach the client through two paths: the file picker
//! (`choose_file`) and drag-and-drop (`drop_file`, which may carry a type
//! declared by whatever produced the drop). Both paths go through
//! [`validate_image_file`], so a file accepted by one is accepted by the
//! other.
//!
//! The surface never touches controller state. It hands back a
//! [`SelectedFile`] and the caller passes it on.

use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::sync::Arc;

/// Upper bound on accepted uploads.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

const FALLBACK_FILE_NAME: &str = "upload";

/// A file the user picked, with the MIME type resolved at validation time.
///
/// Bytes are shared, so cloning a selection for an outgoing request is cheap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    mime_type: String,
    bytes: Arc<[u8]>,
}

impl SelectedFile {
    /// Validate raw bytes and wrap them as a selection.
    pub fn from_bytes(name: &str, declared_mime: Option<&str>, bytes: Vec<u8>) -> Result<Self> {
        let mime_type = validate_image_file(name, declared_mime, &bytes)?;
        Ok(Self {
            name: name.to_string(),
            mime_type,
            bytes: Arc::from(bytes),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Resolve and check the MIME type of an upload.
///
/// Order of evidence: the content itself (magic bytes), then the declared
/// type, then the file name. The result must be `image/*`.
pub fn validate_image_file(name: &str, declared_mime: Option<&str>, bytes: &[u8]) -> Result<String> {
    if bytes.is_empty() {
        return Err(anyhow!("{} is empty", display_name(name)));
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(anyhow!(
            "{} is too large: {} bytes (max {} bytes)",
            display_name(name),
            bytes.len(),
            MAX_UPLOAD_BYTES
        ));
    }

    let mime = match image::guess_format(bytes) {
        Ok(format) => format.to_mime_type().to_string(),
        Err(_) => declared_mime
            .map(|mime| mime.trim().to_ascii_lowercase())
            .filter(|mime| !mime.is_empty())
            .unwrap_or_else(|| {
                mime_guess::from_path(name)
                    .first_or_octet_stream()
                    .essence_str()
                    .to_string()
            }),
    };

    if !mime.starts_with("image/") {
        return Err(anyhow!(
            "{} is not an image (detected type {})",
            display_name(name),
            mime
        ));
    }
    log::debug!("accepted {} as {}", display_name(name), mime);
    Ok(mime)
}

/// Where a selection came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadSource {
    Picker,
    Drop,
}

/// Accepts files from the picker or a drop, unless disabled.
#[derive(Debug, Default)]
pub struct UploadSurface {
    disabled: bool,
}

impl UploadSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Disabled while a detection request is in flight.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Label of the picker control.
    pub fn prompt_label(&self) -> &'static str {
        if self.disabled {
            "Processing..."
        } else {
            "Choose File"
        }
    }

    /// File-picker path.
    pub fn choose_file(&self, path: &Path) -> Result<SelectedFile> {
        self.accept(path, None, UploadSource::Picker)
    }

    /// Drag-and-drop path. `declared_mime` is the type reported with the drop.
    pub fn drop_file(&self, path: &Path, declared_mime: Option<&str>) -> Result<SelectedFile> {
        self.accept(path, declared_mime, UploadSource::Drop)
    }

    fn accept(
        &self,
        path: &Path,
        declared_mime: Option<&str>,
        source: UploadSource,
    ) -> Result<SelectedFile> {
        if self.disabled {
            return Err(anyhow!("upload is disabled while a detection is in progress"));
        }
        let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(FALLBACK_FILE_NAME);
        let file = SelectedFile::from_bytes(name, declared_mime, bytes)?;
        log::info!(
            "selected {} ({}, {} bytes) via {:?}",
            file.name(),
            file.mime_type(),
            file.len(),
            source
        );
        Ok(file)
    }
}

fn display_name(name: &str) -> &str {
    if name.is_empty() {
        FALLBACK_FILE_NAME
    } else {
        name
    }
}
