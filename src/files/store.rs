//! Legacy local-disk file store
//!
//! Filesystem-backed alternative to the blob-backed attachment store, for
//! deployments without a blob backend. Files live flat under a single
//! upload root under their original names; uploading an existing name
//! overwrites it.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

use crate::shared::AppError;

pub struct DiskFileStore {
    root: PathBuf,
}

impl DiskFileStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `name` inside the upload root
    ///
    /// Only a single normal path component is accepted; anything with
    /// separators or parent components is rejected before the joined path
    /// is double-checked against the root.
    fn resolve(&self, name: &str) -> Result<PathBuf, AppError> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => {}
            _ => return Err(AppError::PathTraversalRejected),
        }

        let full = self.root.join(name);
        if !full.starts_with(&self.root) {
            return Err(AppError::PathTraversalRejected);
        }
        Ok(full)
    }

    /// Lists visible entry names, hidden files excluded
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<String>, AppError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&self.root).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with('.') {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Writes `data` under the file's original name, overwriting any
    /// existing file of the same name
    #[instrument(skip(self, data))]
    pub async fn save(&self, name: &str, data: &[u8]) -> Result<PathBuf, AppError> {
        let path = self.resolve(name)?;

        fs::create_dir_all(&self.root).await?;
        fs::write(&path, data).await?;

        info!(name = %name, bytes = data.len(), "File saved");
        Ok(path)
    }

    /// Removes one file by name; removing a missing file succeeds
    #[instrument(skip(self))]
    pub async fn delete(&self, name: &str) -> Result<(), AppError> {
        let path = self.resolve(name)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                info!(name = %name, "File deleted");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes every file under the upload root
    #[instrument(skip(self))]
    pub async fn delete_all(&self) -> Result<(), AppError> {
        if !self.root.exists() {
            return Ok(());
        }

        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                fs::remove_file(entry.path()).await?;
                debug!(path = %entry.path().display(), "File removed");
            }
        }
        info!("Upload root cleared");
        Ok(())
    }
}
