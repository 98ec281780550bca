//! Artifact writers and the output directory layout.

use std::fmt::Display;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{PreprocessError, Result};
use crate::utils::matrix::{npz, CsrMatrix};

pub const VOCABULARY_NAMESPACE: &str = "vampire";
/// Label namespaces that never receive padding tokens downstream
pub const NON_PADDED_NAMESPACES: [&str; 3] = ["*tags", "*labels", VOCABULARY_NAMESPACE];

/// Paths of every artifact under one serialization directory
///
/// ```text
/// OUT/train.npz, OUT/dev.npz, OUT/vampire.bgfreq, OUT/sources.txt
/// OUT/vocabulary/{vampire.txt, covariate.txt, non_padded_namespaces.txt}
/// ```
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    /// Create `root` and `root/vocabulary` when missing.
    /// Only those two levels are created; a missing parent of `root` is an error.
    pub fn prepare(root: impl Into<PathBuf>) -> Result<Self> {
        let layout = Self { root: root.into() };
        for dir in [layout.root.clone(), layout.vocabulary_dir()] {
            if !dir.is_dir() {
                fs::create_dir(&dir).map_err(|e| PreprocessError::io(&dir, e))?;
            }
        }
        Ok(layout)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn vocabulary_dir(&self) -> PathBuf {
        self.root.join("vocabulary")
    }

    pub fn train_matrix(&self) -> PathBuf {
        self.root.join("train.npz")
    }

    pub fn dev_matrix(&self) -> PathBuf {
        self.root.join("dev.npz")
    }

    pub fn background_frequency(&self) -> PathBuf {
        self.root.join(format!("{VOCABULARY_NAMESPACE}.bgfreq"))
    }

    pub fn sources(&self) -> PathBuf {
        self.root.join("sources.txt")
    }

    pub fn vocabulary(&self) -> PathBuf {
        self.vocabulary_dir().join(format!("{VOCABULARY_NAMESPACE}.txt"))
    }

    pub fn covariate_vocabulary(&self) -> PathBuf {
        self.vocabulary_dir().join("covariate.txt")
    }

    pub fn non_padded_namespaces(&self) -> PathBuf {
        self.vocabulary_dir().join("non_padded_namespaces.txt")
    }
}

/// Write a sparse matrix as `.npz`
pub fn save_sparse_matrix<N: npz::NpyElement>(matrix: &CsrMatrix<N>, path: &Path) -> Result<()> {
    npz::save_npz(matrix, path)
}

/// Write `value` as a single JSON document
pub fn save_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| PreprocessError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush().map_err(|e| PreprocessError::io(path, e))
}

/// Write one item per line, replacing the file
pub fn save_lines<I>(lines: I, path: &Path) -> Result<()>
where
    I: IntoIterator,
    I::Item: Display,
{
    let file = File::create(path).map_err(|e| PreprocessError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    for line in lines {
        writeln!(writer, "{line}").map_err(|e| PreprocessError::io(path, e))?;
    }
    writer.flush().map_err(|e| PreprocessError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn prepare_creates_root_and_vocabulary_dir() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::prepare(dir.path().join("out")).unwrap();
        assert!(layout.vocabulary_dir().is_dir());
        assert_eq!(layout.vocabulary(), dir.path().join("out/vocabulary/vampire.txt"));

        // existing directories are fine
        OutputLayout::prepare(dir.path().join("out")).unwrap();
    }

    #[test]
    fn prepare_does_not_create_missing_ancestors() {
        let dir = tempfile::tempdir().unwrap();
        let err = OutputLayout::prepare(dir.path().join("a/b/out")).unwrap_err();
        assert!(matches!(err, PreprocessError::Io { .. }));
    }

    #[test]
    fn save_lines_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lines.txt");
        save_lines(["one", "two", "three"], &path).unwrap();
        save_lines([4, 5], &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "4\n5\n");
    }

    #[test]
    fn save_json_writes_one_object_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("freq.json");
        let mut map = IndexMap::new();
        map.insert("zeta".to_string(), 0.5);
        map.insert("alpha".to_string(), 0.0);
        save_json(&map, &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"zeta":0.5,"alpha":0.0}"#);
    }

    #[test]
    fn unwritable_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = save_lines(["x"], &dir.path().join("missing/lines.txt")).unwrap_err();
        assert!(matches!(err, PreprocessError::Io { .. }));
    }
}
