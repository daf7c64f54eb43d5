use crate::error::{ProcessingError, Result};
use crate::sync::transfer::{is_transfer_complete, TransferClient};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::warn;

/// Temporary directory that downloads land in before ingestion. Everything in
/// it is removed when the area is dropped.
pub struct StagingArea {
    temp_dir: TempDir,
    staged_files: HashMap<String, PathBuf>,
}

impl StagingArea {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new().map_err(|e| {
            ProcessingError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Failed to create staging directory: {}", e),
            ))
        })?;

        Ok(Self {
            temp_dir,
            staged_files: HashMap::new(),
        })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Download `name` from the client's current directory into the staging area.
    ///
    /// A completion status other than `226 Transfer complete` is a
    /// `TransferFailed` and leaves nothing behind.
    pub fn download<C>(&mut self, client: &mut C, name: &str) -> Result<PathBuf>
    where
        C: TransferClient + ?Sized,
    {
        let local_name = Path::new(name)
            .file_name()
            .ok_or_else(|| ProcessingError::InvalidFormat(format!("Invalid remote file name: '{}'", name)))?;
        let dest_path = self.temp_dir.path().join(local_name);

        let status = {
            let mut writer = BufWriter::new(File::create(&dest_path)?);
            let status = client.retrieve_binary(name, &mut writer)?;
            writer.flush()?;
            status
        };

        if !is_transfer_complete(&status) {
            if let Err(e) = std::fs::remove_file(&dest_path) {
                warn!(file = name, error = %e, "could not remove partial download");
            }
            return Err(ProcessingError::TransferFailed {
                file: name.to_string(),
                status: status.trim().to_string(),
            });
        }

        self.staged_files.insert(name.to_string(), dest_path.clone());
        Ok(dest_path)
    }

    /// Remove a staged file once it has been ingested.
    pub fn discard(&mut self, name: &str) -> Result<()> {
        if let Some(path) = self.staged_files.remove(name) {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}
