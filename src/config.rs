//! Configuration: command line, environment, optional TOML file.
//!
//! Precedence is flag, then environment variable (both handled by clap),
//! then the config file, then built-in defaults. The result is a
//! [`PublishConfig`] holding absolute paths rooted at the project checkout.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;

use crate::api::Credentials;
use crate::archive::Archiver;
use crate::build::BuildTool;
use crate::error::PublishError;

pub const DEFAULT_SERVER_URL: &str = "http://sdk.fifo.site";
pub const DEFAULT_REMOTE_BASE_DIR: &str = "client/dii-media-kit/mac/";
const PROJECT_CONFIG_FILE: &str = "publish.toml";

/// Build the macOS SDK, zip the release output and upload it to the file server.
#[derive(Debug, Clone, Parser)]
#[command(name = "release-publisher", version, about)]
pub struct Cli {
    /// Sub-directory appended to the remote base directory
    #[arg(value_name = "UPLOAD_DIR")]
    pub upload_dir: Option<String>,

    /// Project checkout to build (defaults to the current directory)
    #[arg(long, env = "PUBLISH_PROJECT_ROOT", value_name = "PATH")]
    pub project_root: Option<PathBuf>,

    /// Config file (defaults to ./publish.toml, then the user config dir)
    #[arg(long, env = "PUBLISH_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// File server base URL
    #[arg(long, env = "PUBLISH_SERVER_URL")]
    pub server_url: Option<String>,

    /// File server user
    #[arg(long, env = "PUBLISH_USERNAME")]
    pub username: Option<String>,

    /// File server password
    #[arg(long, env = "PUBLISH_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Remote directory the upload directory is appended to
    #[arg(long, env = "PUBLISH_REMOTE_BASE_DIR")]
    pub remote_base_dir: Option<String>,

    /// Skip clean/build and publish the existing output
    #[arg(long)]
    pub skip_build: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Contents of a config file. Every key is optional.
#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub server_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub remote_base_dir: Option<String>,
    pub http_timeout_secs: Option<u64>,
    pub build: BuildTool,
    pub layout: Layout,
    pub archive: ArchiveSection,
}

/// Where things live inside the project checkout.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Layout {
    pub compile_dir: PathBuf,
    pub output_dir: PathBuf,
    pub version_header: PathBuf,
    pub version_macro: String,
    pub archive_prefix: String,
}

impl Default for Layout {
    fn default() -> Self {
        Layout {
            compile_dir: PathBuf::from("dii_objc/src"),
            output_dir: PathBuf::from("dii_objc/src/build/Release"),
            version_header: PathBuf::from("dii_player/dii_common.h"),
            version_macro: "DII_MEDIA_KIT_VERSION".into(),
            archive_prefix: "dii_mac_".into(),
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveSection {
    /// External zip program; the builtin writer is used when unset.
    pub command: Option<String>,
}

impl FileConfig {
    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid config file")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("In {}", path.display()))
    }
}

/// Paths derived from the (absolute) project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub compile_dir: PathBuf,
    pub output_dir: PathBuf,
    pub version_header: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: &Path, layout: &Layout) -> Self {
        ProjectPaths {
            root: root.to_path_buf(),
            compile_dir: root.join(&layout.compile_dir),
            output_dir: root.join(&layout.output_dir),
            version_header: root.join(&layout.version_header),
        }
    }
}

/// Everything a publishing run needs, fixed for the process lifetime.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    pub paths: ProjectPaths,
    pub build: BuildTool,
    pub archiver: Archiver,
    pub version_macro: String,
    pub archive_prefix: String,
    pub server_url: String,
    pub credentials: Credentials,
    /// Remote base directory with the upload directory appended.
    pub remote_dir: String,
    pub http_timeout: Option<Duration>,
    pub skip_build: bool,
}

/// Supplies credentials that were not configured, e.g. from a terminal prompt.
pub trait CredentialSource {
    fn username(&mut self) -> Result<String>;
    fn password(&mut self, username: &str) -> Result<String>;
}

/// Source used when nobody can be asked.
pub struct NoPrompt;

impl CredentialSource for NoPrompt {
    fn username(&mut self) -> Result<String> {
        Err(PublishError::Config(
            "no username configured (set PUBLISH_USERNAME or --username)".into(),
        )
        .into())
    }

    fn password(&mut self, _username: &str) -> Result<String> {
        Err(PublishError::Config(
            "no password configured (set PUBLISH_PASSWORD or --password)".into(),
        )
        .into())
    }
}

impl Cli {
    /// Absolute project root, falling back to the current directory.
    pub fn root(&self) -> Result<PathBuf> {
        match &self.project_root {
            Some(root) => std::path::absolute(root)
                .with_context(|| format!("Invalid project root {}", root.display())),
            None => std::env::current_dir().context("Failed to read current directory"),
        }
    }

    /// Locate and load the config file, if any.
    pub fn file_config(&self, root: &Path) -> Result<FileConfig> {
        if let Some(path) = &self.config {
            return FileConfig::load(path);
        }
        let candidates = [
            Some(root.join(PROJECT_CONFIG_FILE)),
            dirs::config_dir().map(|d| d.join("release-publisher").join("config.toml")),
        ];
        for path in candidates.into_iter().flatten() {
            if path.is_file() {
                tracing::debug!(path = %path.display(), "loading config file");
                return FileConfig::load(&path);
            }
        }
        Ok(FileConfig::default())
    }

    /// Merge flags, environment and file into a [`PublishConfig`].
    pub fn resolve(&self, file: FileConfig, prompt: &mut dyn CredentialSource) -> Result<PublishConfig> {
        let root = self.root()?;
        let paths = ProjectPaths::new(&root, &file.layout);

        let server_url = self
            .server_url
            .clone()
            .or(file.server_url)
            .unwrap_or_else(|| DEFAULT_SERVER_URL.into());
        let remote_base_dir = self
            .remote_base_dir
            .clone()
            .or(file.remote_base_dir)
            .unwrap_or_else(|| DEFAULT_REMOTE_BASE_DIR.into());

        let username = match self.username.clone().or(file.username) {
            Some(u) => u,
            None => prompt.username()?,
        };
        let password = match self.password.clone().or(file.password) {
            Some(p) => p,
            None => prompt.password(&username)?,
        };

        let archiver = match file.archive.command {
            Some(program) => Archiver::Command(program),
            None => Archiver::Builtin,
        };

        Ok(PublishConfig {
            paths,
            build: file.build,
            archiver,
            version_macro: file.layout.version_macro,
            archive_prefix: file.layout.archive_prefix,
            server_url,
            credentials: Credentials { username, password },
            remote_dir: format!(
                "{remote_base_dir}{}",
                self.upload_dir.as_deref().unwrap_or_default()
            ),
            http_timeout: file.http_timeout_secs.map(Duration::from_secs),
            skip_build: self.skip_build,
        })
    }
}
