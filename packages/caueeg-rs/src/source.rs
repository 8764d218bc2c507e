//! Source dataset layout.
//!
//! The converter reads a fixed tree:
//!
//! ```text
//! <root>/
//!   annotation.csv            CSV export of the annotation spreadsheet
//!   dementia.json             dementia task split
//!   dementia-no-overlap.json  dementia split without participant overlap
//!   abnormal.json             normality task split
//!   abnormal-no-overlap.json  normality split without participant overlap
//!   signal/edf/<serial>.edf   raw recordings
//!   event/<serial>.json       per-recording event annotations
//! ```

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{CaueegError, Result};

#[derive(Debug, Clone)]
pub struct SourceLayout {
    root: PathBuf,
}

impl SourceLayout {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn check(&self) -> Result<()> {
        if !self.root.is_dir() {
            return Err(CaueegError::SourceNotFound(self.root.display().to_string()));
        }
        Ok(())
    }

    pub fn annotation_table(&self) -> PathBuf {
        self.root.join("annotation.csv")
    }

    pub fn dementia_split(&self) -> PathBuf {
        self.root.join("dementia.json")
    }

    pub fn dementia_split_no_overlap(&self) -> PathBuf {
        self.root.join("dementia-no-overlap.json")
    }

    pub fn normality_split(&self) -> PathBuf {
        self.root.join("abnormal.json")
    }

    pub fn normality_split_no_overlap(&self) -> PathBuf {
        self.root.join("abnormal-no-overlap.json")
    }

    pub fn edf_file(&self, serial: &str) -> PathBuf {
        self.root.join("signal").join("edf").join(format!("{}.edf", serial))
    }

    pub fn event_file(&self, serial: &str) -> PathBuf {
        self.root.join("event").join(format!("{}.json", serial))
    }
}

/// What a source tree actually contains; the `info` surface.
#[derive(Debug, Clone, Serialize)]
pub struct SourceInventory {
    pub root: String,
    pub exists: bool,
    pub edf_files: usize,
    pub event_files: usize,
    pub annotation_table: bool,
    pub split_files_present: Vec<String>,
    pub split_files_missing: Vec<String>,
}

impl SourceInventory {
    pub fn scan(layout: &SourceLayout) -> SourceInventory {
        let exists = layout.root().is_dir();
        let split_paths = [
            layout.dementia_split(),
            layout.dementia_split_no_overlap(),
            layout.normality_split(),
            layout.normality_split_no_overlap(),
        ];
        let mut present = Vec::new();
        let mut missing = Vec::new();
        for path in split_paths {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if path.is_file() {
                present.push(name);
            } else {
                missing.push(name);
            }
        }

        SourceInventory {
            root: layout.root().display().to_string(),
            exists,
            edf_files: count_glob(&layout.root().join("signal").join("edf"), "*.edf"),
            event_files: count_glob(&layout.root().join("event"), "*.json"),
            annotation_table: layout.annotation_table().is_file(),
            split_files_present: present,
            split_files_missing: missing,
        }
    }
}

fn count_glob(dir: &Path, pattern: &str) -> usize {
    let pattern = dir.join(pattern).to_string_lossy().into_owned();
    match glob::glob(&pattern) {
        Ok(paths) => paths.filter_map(|p| p.ok()).filter(|p| p.is_file()).count(),
        Err(e) => {
            log::warn!("Invalid glob pattern '{}': {}", pattern, e);
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn layout_paths() {
        let layout = SourceLayout::new("/data/caueeg");
        assert!(layout.edf_file("00001").ends_with("signal/edf/00001.edf"));
        assert!(layout.event_file("00001").ends_with("event/00001.json"));
        assert!(layout.annotation_table().ends_with("annotation.csv"));
    }

    #[test]
    fn check_rejects_missing_root() {
        let layout = SourceLayout::new("/nonexistent_dir_12345");
        assert!(matches!(
            layout.check(),
            Err(CaueegError::SourceNotFound(_))
        ));
    }

    #[test]
    fn inventory_counts_source_files() {
        let dir = tempfile::tempdir().unwrap();
        let layout = SourceLayout::new(dir.path());
        fixtures::write_annotation_csv(&layout.annotation_table(), &[("00001", "normal")]).unwrap();
        fixtures::write_empty_splits(&layout).unwrap();
        fixtures::write_edf(&layout.edf_file("00001"), &["Fp1-AVG"], 100, 1).unwrap();
        fixtures::write_events_json(&layout.event_file("00001"), &[(0, "Eyes Open")]).unwrap();

        let inventory = SourceInventory::scan(&layout);
        assert!(inventory.exists);
        assert_eq!(inventory.edf_files, 1);
        assert_eq!(inventory.event_files, 1);
        assert!(inventory.annotation_table);
        assert_eq!(inventory.split_files_present.len(), 4);
        assert!(inventory.split_files_missing.is_empty());
    }
}
