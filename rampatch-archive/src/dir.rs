//! Moving an extracted ramdisk tree in and out of a [`MemoryArchive`].

use crate::memory::MemoryArchive;
use crate::ports::Archive;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum ArchiveIoError {
    #[error("walk {root}: {source}")]
    Walk {
        root: Utf8PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("non UTF-8 entry path {}", path.display())]
    NonUtf8Path { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Load every regular file under `root` into a `MemoryArchive`.
///
/// Symlinks and directories are not entries; names are relative to `root` and use `/`.
pub fn load_dir(root: &Utf8Path) -> Result<MemoryArchive, ArchiveIoError> {
    let mut archive = MemoryArchive::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| ArchiveIoError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let rel = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_path_buf();
        let rel = Utf8PathBuf::from_path_buf(rel)
            .map_err(|path| ArchiveIoError::NonUtf8Path { path })?;
        let name = rel
            .components()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join("/");

        let contents = fs::read(entry.path())?;
        debug!(entry = name.as_str(), bytes = contents.len(), "loaded entry");
        archive.insert(name, contents);
    }

    Ok(archive)
}

/// Write entries of `after` that differ from `before` back under `root`.
///
/// When `backup_root` is set, an existing file is first copied to the same relative path under
/// `backup_root`. The backup tree must live outside `root` so it never becomes part of the
/// ramdisk. An existing backup is kept, so it always holds the contents from before the first
/// run. Returns the names of the written entries.
pub fn persist_changes(
    root: &Utf8Path,
    before: &MemoryArchive,
    after: &MemoryArchive,
    backup_root: Option<&Utf8Path>,
) -> Result<Vec<String>, ArchiveIoError> {
    let changed = after.changed_since(before);

    for name in &changed {
        let target = root.join(name);
        if let Some(backup_root) = backup_root
            && target.exists()
        {
            let backup = backup_root.join(name);
            if backup.exists() {
                debug!(entry = name.as_str(), backup = backup.as_str(), "keeping earlier backup");
            } else {
                if let Some(parent) = backup.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::copy(&target, &backup)?;
                debug!(entry = name.as_str(), backup = backup.as_str(), "backed up entry");
            }
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = after.read(name).unwrap_or_default();
        fs::write(&target, contents)?;
        debug!(entry = name.as_str(), "wrote entry");
    }

    Ok(changed)
}
