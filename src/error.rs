// Error type shared by every publishing step. Each step returns a
// `PublishError` and lets `main` decide how to terminate.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use reqwest::StatusCode;
use thiserror::Error;

pub type PublishResult<T> = Result<T, PublishError>;

#[derive(Debug, Error)]
pub enum PublishError {
    /// A directory or file the workflow depends on is absent.
    #[error("{} does not exist", .0.display())]
    MissingPath(PathBuf),

    /// An external tool could not be started at all.
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// An external tool ran and returned a non-zero status.
    #[error("`{command}` failed with {status}")]
    CommandFailed { command: String, status: ExitStatus },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("can not get version: no `{macro_name}` line in {}", path.display())]
    VersionNotFound { macro_name: String, path: PathBuf },

    #[error("failed to write archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file server answered with something other than 201 Created.
    #[error("file server {step} failed: HTTP {status}")]
    UnexpectedStatus {
        step: &'static str,
        status: StatusCode,
    },

    #[error("file server login response is missing the `{0}` cookie")]
    MissingCookie(&'static str),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}
