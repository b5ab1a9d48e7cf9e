//! On-disk layout for the documents a run produces.
//!
//! Every run works against three sibling directories under one root:
//! `original/` holds the untouched intake copy, `preview/` the annotated
//! review copy, `redacted/` the destructive outputs. Output names derive
//! from the original file stem plus a pass suffix, so a directory listing
//! alone tells you which artifact came from which source and pass.

use std::path::{Path, PathBuf};

use crate::RedactionError;

const PREVIEW_SUFFIX: &str = "_PREVIEW";
const AI_SUFFIX: &str = "_AI_REDACTED";
const MANUAL_SUFFIX: &str = "_MANUAL_REDACTED";
const COMBINED_SUFFIX: &str = "_COMBINED_REDACTED";

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    original_dir: PathBuf,
    preview_dir: PathBuf,
    redacted_dir: PathBuf,
}

impl ArtifactStore {
    /// Create the store rooted at `root`, making the three directories if
    /// they are missing.
    pub fn open(root: &Path) -> Result<Self, RedactionError> {
        let store = Self {
            original_dir: root.join("original"),
            preview_dir: root.join("preview"),
            redacted_dir: root.join("redacted"),
        };
        std::fs::create_dir_all(&store.original_dir)?;
        std::fs::create_dir_all(&store.preview_dir)?;
        std::fs::create_dir_all(&store.redacted_dir)?;
        Ok(store)
    }

    /// Copy a source document into `original/` and return the stored
    /// path. All later stages read this copy, never the caller's file.
    pub fn import_original(&self, source: &Path) -> Result<PathBuf, RedactionError> {
        let name = source
            .file_name()
            .ok_or_else(|| RedactionError::Pdf(format!("not a file: {}", source.display())))?;
        let stored = self.original_dir.join(name);
        std::fs::copy(source, &stored)?;
        tracing::debug!(original = %stored.display(), "imported source document");
        Ok(stored)
    }

    pub fn original_dir(&self) -> &Path {
        &self.original_dir
    }

    pub fn preview_path(&self, original: &Path) -> PathBuf {
        self.preview_dir.join(suffixed(original, PREVIEW_SUFFIX))
    }

    pub fn ai_redacted_path(&self, original: &Path) -> PathBuf {
        self.redacted_dir.join(suffixed(original, AI_SUFFIX))
    }

    pub fn manual_redacted_path(&self, original: &Path) -> PathBuf {
        self.redacted_dir.join(suffixed(original, MANUAL_SUFFIX))
    }

    pub fn combined_redacted_path(&self, original: &Path) -> PathBuf {
        self.redacted_dir.join(suffixed(original, COMBINED_SUFFIX))
    }
}

fn suffixed(original: &Path, suffix: &str) -> String {
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    format!("{}{}.pdf", stem, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_open_creates_directory_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        assert!(store.original_dir().is_dir());
        assert!(dir.path().join("preview").is_dir());
        assert!(dir.path().join("redacted").is_dir());
    }

    #[test]
    fn test_import_copies_without_moving() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        let source = dir.path().join("visa_application.pdf");
        std::fs::write(&source, b"%PDF-1.5").unwrap();

        let stored = store.import_original(&source).unwrap();
        assert_eq!(stored, dir.path().join("original/visa_application.pdf"));
        assert!(source.exists());
        assert_eq!(std::fs::read(&stored).unwrap(), b"%PDF-1.5");
    }

    #[test]
    fn test_artifact_names_follow_pass_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        let original = dir.path().join("original/i20_form.pdf");

        assert_eq!(
            store.preview_path(&original),
            dir.path().join("preview/i20_form_PREVIEW.pdf")
        );
        assert_eq!(
            store.ai_redacted_path(&original),
            dir.path().join("redacted/i20_form_AI_REDACTED.pdf")
        );
        assert_eq!(
            store.manual_redacted_path(&original),
            dir.path().join("redacted/i20_form_MANUAL_REDACTED.pdf")
        );
        assert_eq!(
            store.combined_redacted_path(&original),
            dir.path().join("redacted/i20_form_COMBINED_REDACTED.pdf")
        );
    }
}
