//! Zip archive creation for the build output directory.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::build::{display_command, run_tool};
use crate::error::{PublishError, PublishResult};

/// How the output directory is turned into a zip file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Archiver {
    /// Written in-process with the `zip` crate.
    #[default]
    Builtin,
    /// `<program> -r <archive> ./` run inside the output directory.
    Command(String),
}

/// `YYYYMMDD_HHMM` stamp used in archive names.
pub fn timestamp<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("%Y%m%d_%H%M").to_string()
}

/// `<prefix><version>_<timestamp>.zip`
pub fn archive_file_name(prefix: &str, version: &str, timestamp: &str) -> String {
    format!("{prefix}{version}_{timestamp}.zip")
}

impl Archiver {
    /// Archive everything below `source_dir` into `archive_path`.
    pub fn create(&self, source_dir: &Path, archive_path: &Path) -> PublishResult<()> {
        if !source_dir.is_dir() {
            return Err(PublishError::MissingPath(source_dir.to_path_buf()));
        }
        info!(archive = %archive_path.display(), "archiving build output");
        match self {
            Archiver::Builtin => write_zip(source_dir, archive_path),
            Archiver::Command(program) => {
                // The tool runs inside `source_dir`, so a relative target
                // would resolve against the wrong directory.
                let target = std::path::absolute(archive_path)?;
                let target = target.to_string_lossy();
                let args = ["-r", &*target, "./"];
                let status = run_tool(program, &args, source_dir)?;
                if status.success() {
                    Ok(())
                } else {
                    Err(PublishError::CommandFailed {
                        command: display_command(program, &args),
                        status,
                    })
                }
            }
        }
    }
}

fn write_zip(source_dir: &Path, archive_path: &Path) -> PublishResult<()> {
    let file = File::create(archive_path)?;
    let mut zip = ZipWriter::new(file);
    let base = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(source_dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        let path = entry.path();
        if path == archive_path {
            continue;
        }
        let name = entry_name(source_dir, path);
        let file_type = entry.file_type();
        let options = with_permissions(base, &entry.metadata().map_err(io::Error::from)?);

        if file_type.is_symlink() {
            let target = fs::read_link(path)?;
            debug!(%name, target = %target.display(), "adding symlink");
            zip.add_symlink(name, target.to_string_lossy().into_owned(), options)?;
        } else if file_type.is_dir() {
            zip.add_directory(format!("{name}/"), options)?;
        } else {
            debug!(%name, "adding file");
            zip.start_file(name, options)?;
            let mut src = File::open(path)?;
            io::copy(&mut src, &mut zip)?;
        }
    }

    zip.finish()?;
    Ok(())
}

/// Relative, `/`-separated entry name.
fn entry_name(base: &Path, path: &Path) -> String {
    let rel: PathBuf = path.strip_prefix(base).unwrap_or(path).to_path_buf();
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(unix)]
fn with_permissions(options: SimpleFileOptions, meta: &fs::Metadata) -> SimpleFileOptions {
    use std::os::unix::fs::PermissionsExt;
    options.unix_permissions(meta.permissions().mode())
}

#[cfg(not(unix))]
fn with_permissions(options: SimpleFileOptions, _meta: &fs::Metadata) -> SimpleFileOptions {
    options
}
