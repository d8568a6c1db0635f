//! Write-fsync-rename file replacement.
//!
//! 1. Write to a uniquely named temporary file in the target directory
//! 2. fsync the temporary file
//! 3. Atomic rename over the final path
//! 4. fsync the parent directory
//!
//! Readers observe either the previous file or the complete new one.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A file being written under a temporary name next to its target.
///
/// `commit` moves it into place. Dropping it uncommitted removes the
/// temporary file.
#[derive(Debug)]
pub struct PendingFile {
    target: PathBuf,
    temp_path: PathBuf,
    committed: bool,
}

impl PendingFile {
    /// Create the temporary file for `target`.
    ///
    /// Returns the handle to write through; pass it back to `commit`.
    pub fn create(target: &Path) -> io::Result<(PendingFile, File)> {
        let temp_path = temp_path_for(target)?;
        let file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&temp_path)?;
        let pending = PendingFile {
            target: target.to_path_buf(),
            temp_path,
            committed: false,
        };
        Ok((pending, file))
    }

    /// Final path of the file.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// fsync `file`, rename it over the target and fsync the directory.
    pub fn commit(mut self, file: File) -> io::Result<()> {
        file.sync_all()?;
        drop(file);
        std::fs::rename(&self.temp_path, &self.target)?;
        self.committed = true;
        if let Some(parent) = self.target.parent() {
            sync_dir(parent)?;
        }
        Ok(())
    }
}

impl Drop for PendingFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = std::fs::remove_file(&self.temp_path);
        }
    }
}

/// Atomically replace `path` with `data`.
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let (pending, mut file) = PendingFile::create(path)?;
    file.write_all(data)?;
    pending.commit(file)
}

/// fsync a directory so renames inside it are durable.
pub fn sync_dir(dir: &Path) -> io::Result<()> {
    let dir_fd = File::open(dir)?;
    dir_fd.sync_all()
}

/// Check if a file name is a leftover temporary file.
pub fn is_temp_file(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(".tmp")
}

fn temp_path_for(path: &Path) -> io::Result<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("not a file path: {}", path.display()),
        )
    })?;
    let temp_name = format!(
        ".{}.{}.tmp",
        name.to_string_lossy(),
        Uuid::new_v4().simple()
    );
    Ok(path.with_file_name(temp_name))
}
