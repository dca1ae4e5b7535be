// src/install/archive.rs

//! Pulling individual binaries out of a downloaded zip archive.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::debug;
use zip::ZipArchive;

use crate::errors::{BootstrapError, Result};

/// Extract every entry whose file name is one of `file_names`, wherever it
/// sits in the archive tree, flattened into `dest`. Existing files are
/// replaced.
///
/// Returns the written paths in archive order. A file that is not a zip
/// archive is reported together with its size.
pub fn extract_binaries(archive: &Path, dest: &Path, file_names: &[String]) -> Result<Vec<PathBuf>> {
    let file = File::open(archive)?;
    let size = file.metadata()?.len();

    let mut zip = ZipArchive::new(file).map_err(|e| BootstrapError::Archive {
        path: archive.to_path_buf(),
        reason: format!("not a valid zip archive ({} bytes): {}", size, e),
    })?;

    let matcher = file_matcher(file_names)?;
    let mut written = Vec::new();

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(|e| BootstrapError::Archive {
            path: archive.to_path_buf(),
            reason: format!("entry {}: {}", index, e),
        })?;

        if entry.is_dir() || !matcher.is_match(entry.name()) {
            continue;
        }

        let Some(file_name) = Path::new(entry.name()).file_name().map(|n| n.to_os_string()) else {
            continue;
        };

        let target = dest.join(file_name);
        if target.exists() {
            fs::remove_file(&target)?;
        }

        debug!(entry = entry.name(), target = ?target, "extracting");
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        make_executable(&target)?;

        written.push(target);
    }

    Ok(written)
}

fn file_matcher(file_names: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for name in file_names {
        let glob = Glob::new(&format!("**/{}", name)).map_err(|e| {
            BootstrapError::ConfigError(format!("invalid tool name '{}': {}", name, e))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| BootstrapError::ConfigError(format!("building tool matcher: {}", e)))
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o755);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
