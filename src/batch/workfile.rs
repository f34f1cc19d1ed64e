use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::document::Document;

/// On-disk copy of the document handed to the host for batch processing.
///
/// Removed on drop; removal failures are ignored.
#[derive(Debug)]
pub struct WorkingCopy {
    path: PathBuf,
}

impl WorkingCopy {
    /// `<dir>/<stem><suffix>` next to `document`.
    pub fn path_for(document: &Path, suffix: &str) -> PathBuf {
        let stem = document
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        document.with_file_name(format!("{stem}{suffix}"))
    }

    pub fn create(document: &Path, suffix: &str, doc: &Document) -> Result<Self> {
        let path = Self::path_for(document, suffix);
        // Guard first so a partial write is still cleaned up.
        let copy = Self { path };
        doc.save(&copy.path)?;
        tracing::debug!(path = %copy.path.display(), "working copy written");
        Ok(copy)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Document> {
        Document::load(&self.path)
    }
}

impl Drop for WorkingCopy {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_sits_next_to_document() {
        let path = WorkingCopy::path_for(Path::new("/tmp/ink_ext_abc.svg"), "-pathops.svg");
        assert_eq!(path, PathBuf::from("/tmp/ink_ext_abc-pathops.svg"));
    }

    #[test]
    fn removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("drawing.svg");
        let doc = Document::parse(r#"<svg xmlns="http://www.w3.org/2000/svg"><rect id="r"/></svg>"#).unwrap();

        let copy = WorkingCopy::create(&input, "-pathops.svg", &doc).unwrap();
        let path = copy.path().to_path_buf();
        assert!(path.exists());
        assert!(copy.load().unwrap().get_element_by_id("r").is_some());

        drop(copy);
        assert!(!path.exists());
    }

    #[test]
    fn drop_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("drawing.svg");
        let doc = Document::parse(r#"<svg xmlns="http://www.w3.org/2000/svg"/>"#).unwrap();

        let copy = WorkingCopy::create(&input, "-pathops.svg", &doc).unwrap();
        fs::remove_file(copy.path()).unwrap();
        drop(copy);
    }
}
