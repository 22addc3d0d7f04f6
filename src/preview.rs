//! Preview resources and the preview pane.
//!
//! A preview URL is a revocable local reference to the bytes of the selected
//! file. [`PreviewRegistry`] is the table those URLs live in; a
//! [`PreviewHandle`] owns exactly one entry and revokes it when dropped, so
//! replacing or discarding a handle can never leak an entry.

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{GenericImageView, ImageFormat};
use rand::RngCore;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::detect::DetectionResponse;
use crate::upload::SelectedFile;

const PREVIEW_URL_PREFIX: &str = "blob:visionguard/";
const JPEG_DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

#[derive(Clone, Debug)]
struct PreviewEntry {
    mime_type: String,
    bytes: Arc<[u8]>,
}

/// Table of live preview URLs.
///
/// Cloning shares the table.
#[derive(Clone, Debug, Default)]
pub struct PreviewRegistry {
    entries: Arc<Mutex<HashMap<String, PreviewEntry>>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the file's bytes under a fresh URL.
    pub fn create(&self, file: &SelectedFile) -> Result<PreviewHandle> {
        let mut token = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut token);
        let url = format!("{}{}", PREVIEW_URL_PREFIX, hex::encode(token));
        let entry = PreviewEntry {
            mime_type: file.mime_type().to_string(),
            bytes: file.shared_bytes(),
        };
        self.entries
            .lock()
            .map_err(|_| anyhow!("preview registry lock poisoned"))?
            .insert(url.clone(), entry);
        log::debug!("created preview {} for {}", url, file.name());
        Ok(PreviewHandle {
            url,
            registry: self.clone(),
        })
    }

    /// Bytes and MIME type behind a live URL.
    pub fn resolve(&self, url: &str) -> Option<(String, Arc<[u8]>)> {
        let entries = self.entries.lock().ok()?;
        entries
            .get(url)
            .map(|entry| (entry.mime_type.clone(), Arc::clone(&entry.bytes)))
    }

    /// Number of URLs not yet revoked.
    pub fn live_count(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_live(&self, url: &str) -> bool {
        self.entries
            .lock()
            .map(|entries| entries.contains_key(url))
            .unwrap_or(false)
    }

    fn revoke(&self, url: &str) {
        match self.entries.lock() {
            Ok(mut entries) => {
                if entries.remove(url).is_some() {
                    log::debug!("revoked preview {}", url);
                }
            }
            Err(_) => log::warn!("preview registry lock poisoned; {} not revoked", url),
        }
    }
}

/// Owner of one preview URL. Dropping it revokes the URL.
#[derive(Debug)]
pub struct PreviewHandle {
    url: String,
    registry: PreviewRegistry,
}

impl PreviewHandle {
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.registry.revoke(&self.url);
    }
}

/// Data URI for a base64 JPEG payload, used as-is.
pub fn jpeg_data_uri(base64_jpeg: &str) -> String {
    format!("{}{}", JPEG_DATA_URI_PREFIX, base64_jpeg)
}

/// What the preview pane shows: the original, and the annotated copy once
/// the server has returned one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreviewView {
    pub original_url: String,
    pub annotated_data_uri: Option<String>,
}

impl PreviewView {
    pub fn new(original: &PreviewHandle, result: Option<&DetectionResponse>) -> Self {
        Self {
            original_url: original.url().to_string(),
            annotated_data_uri: result
                .and_then(|response| response.annotated_image.as_deref())
                .filter(|payload| !payload.is_empty())
                .map(jpeg_data_uri),
        }
    }
}

impl fmt::Display for PreviewView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Original Image")?;
        writeln!(f, "  {}", self.original_url)?;
        if let Some(uri) = &self.annotated_data_uri {
            writeln!(f, "Detection Results")?;
            writeln!(f, "  annotated JPEG ({} bytes as data URI)", uri.len())?;
        }
        Ok(())
    }
}

/// Decoded form of the server's annotated image.
#[derive(Clone, Debug)]
pub struct AnnotatedImage {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
}

impl AnnotatedImage {
    /// Decode a base64 JPEG payload and check that it is a readable image.
    pub fn decode(base64_jpeg: &str) -> Result<Self> {
        let payload = base64_jpeg
            .strip_prefix(JPEG_DATA_URI_PREFIX)
            .unwrap_or(base64_jpeg)
            .trim();
        if payload.is_empty() {
            return Err(anyhow!("annotated image payload is empty"));
        }
        let bytes = STANDARD
            .decode(payload)
            .context("annotated image is not valid base64")?;
        let image = image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg)
            .context("annotated image is not a readable JPEG")?;
        let (width, height) = image.dimensions();
        Ok(Self {
            bytes,
            width,
            height,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Write the JPEG bytes unchanged.
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, &self.bytes)
            .with_context(|| format!("write annotated image to {}", path.display()))
    }
}
