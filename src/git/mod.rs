//! Git integration layer for pmg
//!
//! Webhooks only tell us which repository was pushed. Whether that
//! repository is a Puppet module is decided by reading files from the bare
//! mirror kept under `hook.githome`, which is done here with git2.

use anyhow::{Context, Result};
use git2::{ErrorCode, Repository};
use std::path::{Path, PathBuf};

/// Read access to blobs at the `HEAD` of a repository.
pub trait BlobReader: Send + Sync + 'static {
    /// Return the contents of `path` at `HEAD` of `repo_full_name`.
    ///
    /// `Ok(None)` means the repository has no such file at `HEAD`. An `Err`
    /// means the repository itself could not be read.
    fn read_head_blob(&self, repo_full_name: &str, path: &str) -> Result<Option<Vec<u8>>>;
}

/// Bare repositories laid out as `<root>/<org>/<repo>.git`.
#[derive(Debug, Clone)]
pub struct BareRepoStore {
    root: PathBuf,
}

impl BareRepoStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory holding the repositories
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the bare repository for `repo_full_name`
    pub fn repo_path(&self, repo_full_name: &str) -> PathBuf {
        self.root.join(format!("{repo_full_name}.git"))
    }

    fn open(&self, repo_full_name: &str) -> Result<Repository> {
        let path = self.repo_path(repo_full_name);
        Repository::open_bare(&path)
            .with_context(|| format!("Failed to open bare repository {}", path.display()))
    }
}

impl BlobReader for BareRepoStore {
    fn read_head_blob(&self, repo_full_name: &str, path: &str) -> Result<Option<Vec<u8>>> {
        let repo = self.open(repo_full_name)?;

        let object = match repo.revparse_single(&format!("HEAD:{path}")) {
            Ok(object) => object,
            // Missing path and a repository with no commits yet look the same to callers
            Err(e) if matches!(e.code(), ErrorCode::NotFound | ErrorCode::UnbornBranch) => {
                return Ok(None);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to resolve HEAD:{path}"));
            }
        };

        let blob = match object.peel_to_blob() {
            Ok(blob) => blob,
            // HEAD:<path> names a directory
            Err(_) => return Ok(None),
        };

        Ok(Some(blob.content().to_vec()))
    }
}
