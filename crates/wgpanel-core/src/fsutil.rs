// Copyright (C) 2025 Joseph Sacchini
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU Affero General Public License as published by the Free
// Software Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more
// details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Helpers for read-modify-write cycles on small state files.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

/// Exclusive advisory lock on `<target>.lock`, released on drop.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Block until the lock guarding `target` is held.
    pub fn acquire(target: &Path) -> io::Result<Self> {
        let path = lock_path(target);
        ensure_parent(&path)?;

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)?;
        file.lock()?;

        debug!(path = %path.display(), "acquired file lock");
        Ok(Self { file, path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        debug!(path = %self.path.display(), "released file lock");
    }
}

/// Path of the lock file guarding `target`.
pub fn lock_path(target: &Path) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}

/// Replace `path` with `contents` via a temp file in the same directory and a
/// rename, leaving the result readable by the owner only.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = ensure_parent(path)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    set_owner_only(tmp.path())?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Restrict `path` to owner read/write (`0600`).
#[cfg(unix)]
pub fn set_owner_only(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

/// Restrict `path` to owner read/write (no-op off unix).
#[cfg(not(unix))]
pub fn set_owner_only(_path: &Path) -> io::Result<()> {
    Ok(())
}

fn ensure_parent(path: &Path) -> io::Result<&Path> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent)?;
            Ok(parent)
        }
        _ => Ok(Path::new(".")),
    }
}
