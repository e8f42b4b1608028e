//! Picked images.

use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ChatError, ChatResult};

/// An image chosen by the user: something to display and, if available,
/// its base64-encoded pixels for analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageAttachment {
    /// Display reference (path or URI)
    pub reference: String,
    /// Base64 pixel data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl ImageAttachment {
    /// An image known only by reference, with no pixel data.
    pub fn reference_only(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            data: None,
        }
    }

    /// Encode raw bytes; empty input yields no data.
    pub fn from_bytes(reference: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            reference: reference.into(),
            data: (!bytes.is_empty()).then(|| BASE64_STANDARD.encode(bytes)),
        }
    }

    /// The payload to analyze, if there is one.
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref().filter(|d| !d.trim().is_empty())
    }
}

/// Loads images from the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct ImagePicker;

impl ImagePicker {
    pub fn new() -> Self {
        Self
    }

    /// Read an image file; the path becomes the display reference.
    pub fn pick(&self, path: impl AsRef<Path>) -> ChatResult<ImageAttachment> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ChatError::Image(format!("no image file at {:?}", path)));
        }

        let bytes = std::fs::read(path)?;
        debug!("Picked image {:?} ({} bytes)", path, bytes.len());
        Ok(ImageAttachment::from_bytes(path.display().to_string(), &bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_pick_encodes_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("rex.jpg");
        std::fs::write(&path, b"hello").unwrap();

        let image = ImagePicker::new().pick(&path).unwrap();
        assert_eq!(image.data(), Some("aGVsbG8="));
        assert!(image.reference.ends_with("rex.jpg"));
    }

    #[test]
    fn test_empty_file_has_no_data() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("empty.png");
        std::fs::write(&path, b"").unwrap();

        let image = ImagePicker::new().pick(&path).unwrap();
        assert_eq!(image.data(), None);
    }

    #[test]
    fn test_missing_file() {
        let temp = tempdir().unwrap();
        let err = ImagePicker::new().pick(temp.path().join("nope.jpg")).unwrap_err();
        assert!(matches!(err, ChatError::Image(_)));
    }
}
