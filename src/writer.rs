//! Materializes rendered entries under the output directory.

use crate::error::WriteError;
use crate::renderer::Rendered;
use log::debug;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> WriteError + '_ {
    move |source| WriteError::Io { path: path.to_path_buf(), source }
}

fn create_dir_all(path: &Path) -> Result<(), WriteError> {
    fs::create_dir_all(path).map_err(io_error(path))
}

fn write_file(path: &Path, content: &[u8], executable: bool) -> Result<(), WriteError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    fs::write(path, content).map_err(io_error(path))?;
    if executable {
        set_executable(path)?;
    }
    Ok(())
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<(), WriteError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(io_error(path))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<(), WriteError> {
    Ok(())
}

/// Writes every rendered entry below `output_dir`.
///
/// Directories are created with create-if-absent semantics; files are written
/// exactly once. Returns the written paths, files only, in input order.
///
/// # Errors
/// * `WriteError::PathConflict` if two entries target the same path, or a file
///   would have to be the parent directory of another entry
/// * `WriteError::Io` on any filesystem failure
pub fn write_tree<P: AsRef<Path>>(rendered: &[Rendered], output_dir: P) -> Result<Vec<PathBuf>, WriteError> {
    let output_dir = output_dir.as_ref();

    let mut files: HashSet<&Path> = HashSet::new();
    let mut dirs: HashSet<&Path> = HashSet::new();
    for entry in rendered {
        let fresh = match entry {
            Rendered::Directory { path } => {
                !files.contains(path.as_path()) && dirs.insert(path.as_path())
            }
            Rendered::File { path, .. } => {
                !dirs.contains(path.as_path()) && files.insert(path.as_path())
            }
        };
        if !fresh {
            return Err(WriteError::PathConflict { path: output_dir.join(entry.path()) });
        }
    }
    // A file cannot also be the parent of another entry.
    for entry in rendered {
        if let Some(file) = entry.path().ancestors().skip(1).find(|a| files.contains(*a)) {
            return Err(WriteError::PathConflict { path: output_dir.join(file) });
        }
    }

    create_dir_all(output_dir)?;
    let mut written = Vec::new();
    for entry in rendered {
        let target = output_dir.join(entry.path());
        match entry {
            Rendered::Directory { .. } => {
                debug!("Creating directory {}", target.display());
                create_dir_all(&target)?;
            }
            Rendered::File { content, executable, .. } => {
                debug!("Writing file {}", target.display());
                write_file(&target, content, *executable)?;
                written.push(target);
            }
        }
    }
    Ok(written)
}
