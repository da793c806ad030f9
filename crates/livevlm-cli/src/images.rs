//! Reading frame images from disk.

use std::path::Path;

use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Read an image file and return it base64-encoded.
pub fn load_image(path: &Path) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    if bytes.is_empty() {
        bail!("{} is empty", path.display());
    }
    if !looks_like_jpeg(&bytes) {
        tracing::warn!(
            "{} does not look like a JPEG; vendors will be told it is one",
            path.display()
        );
    }
    Ok(STANDARD.encode(bytes))
}

fn looks_like_jpeg(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0xFF, 0xD8, 0xFF])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.jpg");
        std::fs::write(&path, [0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
        assert_eq!(load_image(&path).unwrap(), "/9j/4A==");
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_image(&dir.path().join("nope.jpg")).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn empty_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.jpg");
        std::fs::write(&path, b"").unwrap();
        assert!(load_image(&path).is_err());
    }

    #[test]
    fn jpeg_magic() {
        assert!(looks_like_jpeg(&[0xFF, 0xD8, 0xFF, 0xDB]));
        assert!(!looks_like_jpeg(b"\x89PNG"));
    }
}
