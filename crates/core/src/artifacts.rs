use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::errors::ArtifactWriteError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Faq,
    ProductPage,
    ComparisonPage,
}

impl ArtifactKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Faq => "faq.json",
            Self::ProductPage => "product_page.json",
            Self::ComparisonPage => "comparison_page.json",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Writes finished records as 2-space indented UTF-8 JSON.
#[derive(Clone, Debug)]
pub struct ArtifactWriter {
    directory: PathBuf,
}

impl ArtifactWriter {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self { directory: directory.into() }
    }

    pub fn path_for(&self, kind: ArtifactKind) -> PathBuf {
        self.directory.join(kind.file_name())
    }

    pub fn write<T: Serialize>(
        &self,
        kind: ArtifactKind,
        record: &T,
    ) -> Result<PathBuf, ArtifactWriteError> {
        let path = self.path_for(kind);
        write_json_artifact(&path, record)?;
        Ok(path)
    }
}

/// Replaces `path` with the JSON rendering of `record`, creating missing
/// parent directories.
///
/// The content goes to a sibling temp file first and is renamed into place,
/// so readers never observe a half-written artifact.
pub fn write_json_artifact<T: Serialize>(path: &Path, record: &T) -> Result<(), ArtifactWriteError> {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mut rendered =
        serde_json::to_string_pretty(record).map_err(|error| ArtifactWriteError::new(&filename, error))?;
    rendered.push('\n');

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|error| ArtifactWriteError::new(&filename, error))?;
    let mut staged =
        NamedTempFile::new_in(parent).map_err(|error| ArtifactWriteError::new(&filename, error))?;
    staged
        .write_all(rendered.as_bytes())
        .and_then(|()| staged.as_file().sync_all())
        .map_err(|error| ArtifactWriteError::new(&filename, error))?;
    staged.persist(path).map_err(|error| ArtifactWriteError::new(&filename, error.error))?;

    Ok(())
}
