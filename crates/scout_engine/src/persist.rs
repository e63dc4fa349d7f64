use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use scout_core::JobId;
use tempfile::NamedTempFile;

use crate::filename::artifact_filename;
use crate::Artifact;

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("{} exists and is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("could not create {}: {source}", .path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("could not write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Creates `dir` (and parents) unless it already exists as a directory.
pub fn prepare_download_dir(dir: &Path) -> Result<(), PersistError> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(PersistError::NotADirectory(dir.to_path_buf())),
        Err(_) => fs::create_dir_all(dir).map_err(|source| PersistError::CreateDir {
            path: dir.to_path_buf(),
            source,
        }),
    }
}

/// Saves retrieved artifacts under one download directory.
///
/// Bytes land in a temp file next to the target and are renamed into place,
/// so an interrupted save never leaves a truncated spreadsheet behind. A
/// second download of the same name replaces the first.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn save(&self, job_id: &JobId, artifact: &Artifact) -> Result<PathBuf, PersistError> {
        let name = artifact_filename(artifact.filename.as_deref(), job_id);
        self.save_as(&name, &artifact.bytes)
    }

    /// `name` must already be a sanitized file name.
    pub fn save_as(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, PersistError> {
        prepare_download_dir(&self.dir)?;
        let target = self.dir.join(name);
        let write_error = |source| PersistError::Write {
            path: target.clone(),
            source,
        };

        let mut staged = NamedTempFile::new_in(&self.dir).map_err(write_error)?;
        staged.write_all(bytes).map_err(write_error)?;
        staged.as_file_mut().sync_all().map_err(write_error)?;
        staged
            .persist(&target)
            .map_err(|err| write_error(err.error))?;
        Ok(target)
    }
}
