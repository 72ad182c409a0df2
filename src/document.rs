//! The PDF picked by the user.
//!
//! A document is held as one shared byte buffer. The render worker gets a
//! cheap handle to it and the question upload copies out of it, so there is
//! never a second, independently mutable copy of the file.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

#[derive(Clone)]
pub struct PdfDocument {
    name: String,
    bytes: Arc<[u8]>,
}

impl PdfDocument {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a document from disk. The display name is the file name.
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Handle for the render worker.
    pub fn render_source(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    /// Owned copy of the bytes for a multipart upload.
    pub fn upload_bytes(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    /// True when both values refer to the same buffer.
    pub fn same_buffer(&self, other: &PdfDocument) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }
}

impl fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdfDocument")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn open_reads_bytes_and_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"%PDF-1.4 fake").unwrap();

        let doc = PdfDocument::open(&path).unwrap();
        assert_eq!(doc.name(), "report.pdf");
        assert_eq!(doc.len(), 13);
        assert_eq!(doc.upload_bytes(), b"%PDF-1.4 fake".to_vec());
    }

    #[test]
    fn open_missing_file_mentions_path() {
        let err = PdfDocument::open(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(err.to_string().contains("here.pdf"));
    }

    #[test]
    fn render_source_shares_the_buffer() {
        let doc = PdfDocument::new("a.pdf", b"abc".to_vec());
        let clone = doc.clone();
        assert!(Arc::ptr_eq(&doc.render_source(), &clone.render_source()));
        assert!(doc.same_buffer(&clone));

        let other = PdfDocument::new("a.pdf", b"abc".to_vec());
        assert!(!doc.same_buffer(&other));
    }

    #[test]
    fn debug_does_not_dump_bytes() {
        let doc = PdfDocument::new("a.pdf", vec![0u8; 4096]);
        let printed = format!("{doc:?}");
        assert!(printed.contains("4096"));
        assert!(printed.len() < 100);
    }
}
