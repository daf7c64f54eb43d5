use crate::error::{ProcessingError, Result};
use crate::utils::constants::TRANSFER_COMPLETE;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// A remote file server session (FTP-like): log in, move around, list, download.
pub trait TransferClient {
    fn login(&mut self) -> Result<()>;

    /// Change to `path`, relative to the login directory.
    fn change_directory(&mut self, path: &str) -> Result<()>;

    fn list(&mut self) -> Result<Vec<String>>;

    /// Stream `filename` from the current directory into `sink` and return the
    /// server's completion status line. Only `"226 Transfer complete"` means success.
    fn retrieve_binary(&mut self, filename: &str, sink: &mut dyn Write) -> Result<String>;

    fn close(&mut self) -> Result<()>;
}

pub fn is_transfer_complete(status: &str) -> bool {
    status.trim() == TRANSFER_COMPLETE
}

/// Serves a local directory laid out like the remote server, e.g. a mirror
/// populated with `wget --mirror`.
#[derive(Debug, Clone)]
pub struct LocalMirror {
    root: PathBuf,
    cwd: PathBuf,
    logged_in: bool,
}

impl LocalMirror {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            cwd: root.clone(),
            root,
            logged_in: false,
        }
    }

    fn ensure_logged_in(&self) -> Result<()> {
        if self.logged_in {
            Ok(())
        } else {
            Err(ProcessingError::InvalidFormat(
                "transfer session is not logged in".to_string(),
            ))
        }
    }
}

/// Reject anything that would escape the mirror root.
fn relative_components(path: &str) -> Result<PathBuf> {
    let mut resolved = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir | Component::RootDir => {}
            _ => {
                return Err(ProcessingError::InvalidFormat(format!(
                    "Path leaves the mirror root: '{}'",
                    path
                )))
            }
        }
    }
    Ok(resolved)
}

impl TransferClient for LocalMirror {
    fn login(&mut self) -> Result<()> {
        if !self.root.is_dir() {
            return Err(ProcessingError::InvalidFormat(format!(
                "Mirror root is not a directory: {}",
                self.root.display()
            )));
        }
        self.cwd = self.root.clone();
        self.logged_in = true;
        Ok(())
    }

    fn change_directory(&mut self, path: &str) -> Result<()> {
        self.ensure_logged_in()?;
        let target = self.root.join(relative_components(path)?);
        if !target.is_dir() {
            return Err(ProcessingError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("550 {}: No such directory", path),
            )));
        }
        self.cwd = target;
        Ok(())
    }

    fn list(&mut self) -> Result<Vec<String>> {
        self.ensure_logged_in()?;
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.cwd)? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn retrieve_binary(&mut self, filename: &str, sink: &mut dyn Write) -> Result<String> {
        self.ensure_logged_in()?;
        let path = self.cwd.join(relative_components(filename)?);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) => return Ok(format!("550 {}: {}", filename, e)),
        };
        let bytes = std::io::copy(&mut BufReader::new(file), sink)?;
        debug!(file = filename, bytes, "retrieved from mirror");
        Ok(TRANSFER_COMPLETE.to_string())
    }

    fn close(&mut self) -> Result<()> {
        self.logged_in = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn mirror() -> Result<(TempDir, LocalMirror)> {
        let dir = TempDir::new()?;
        std::fs::create_dir_all(dir.path().join("pub/data/gsod/2020"))?;
        std::fs::write(dir.path().join("pub/data/gsod/ish-history.csv"), "USAF\n")?;
        std::fs::write(dir.path().join("pub/data/gsod/2020/b.op.gz"), "b")?;
        std::fs::write(dir.path().join("pub/data/gsod/2020/a.op.gz"), "a")?;
        let mirror = LocalMirror::new(dir.path());
        Ok((dir, mirror))
    }

    #[test]
    fn test_list_and_retrieve() -> Result<()> {
        let (_dir, mut client) = mirror()?;
        client.login()?;
        client.change_directory("pub/data/gsod/2020")?;

        assert_eq!(client.list()?, vec!["a.op.gz", "b.op.gz"]);

        let mut sink = Vec::new();
        let status = client.retrieve_binary("a.op.gz", &mut sink)?;
        assert!(is_transfer_complete(&status));
        assert_eq!(sink, b"a");
        Ok(())
    }

    #[test]
    fn test_missing_file_is_a_failed_status() -> Result<()> {
        let (_dir, mut client) = mirror()?;
        client.login()?;
        client.change_directory("pub/data/gsod")?;

        let status = client.retrieve_binary("nope.csv", &mut Vec::new())?;
        assert!(status.starts_with("550"));
        assert!(!is_transfer_complete(&status));
        Ok(())
    }

    #[test]
    fn test_requires_login_and_stays_inside_root() -> Result<()> {
        let (_dir, mut client) = mirror()?;
        assert!(client.list().is_err());

        client.login()?;
        assert!(client.change_directory("../etc").is_err());
        assert!(client.change_directory("pub/data/missing").is_err());
        client.close()?;
        assert!(client.list().is_err());
        Ok(())
    }
}
