// Release workflow: build, read the SDK version, archive the output and
// publish it. Steps run strictly in order; the first error stops the run.

use std::path::PathBuf;

use chrono::Local;
use tracing::info;

use crate::api::FileServerClient;
use crate::archive::{archive_file_name, timestamp};
use crate::config::PublishConfig;
use crate::error::{PublishError, PublishResult};
use crate::ui;
use crate::version::read_sdk_version;

pub struct Publisher {
    config: PublishConfig,
    client: FileServerClient,
}

impl Publisher {
    pub fn new(config: PublishConfig) -> PublishResult<Self> {
        let client = FileServerClient::new(&config.server_url, config.http_timeout)?;
        Ok(Publisher { config, client })
    }

    pub fn config(&self) -> &PublishConfig {
        &self.config
    }

    /// Build (unless skipped) then publish. Returns the uploaded archive.
    pub fn run(&self) -> PublishResult<PathBuf> {
        if self.config.skip_build {
            info!("skipping build");
        } else {
            self.build()?;
        }
        self.upload_output()
    }

    /// Clean and build the project in the compile directory.
    pub fn build(&self) -> PublishResult<()> {
        self.config
            .build
            .clean_and_build(&self.config.paths.compile_dir)
    }

    /// Version string from the SDK header, re-read on every call.
    pub fn sdk_version(&self) -> PublishResult<String> {
        read_sdk_version(&self.config.paths.version_header, &self.config.version_macro)
    }

    /// Zip the build output and upload it to the file server.
    pub fn upload_output(&self) -> PublishResult<PathBuf> {
        let version = self.sdk_version()?;
        info!(%version, "sdk version");

        let output_dir = &self.config.paths.output_dir;
        if !output_dir.is_dir() {
            return Err(PublishError::MissingPath(output_dir.clone()));
        }

        let name = archive_file_name(
            &self.config.archive_prefix,
            &version,
            &timestamp(&Local::now()),
        );
        let archive = output_dir.join(name);
        self.config.archiver.create(output_dir, &archive)?;

        let session = ui::with_spinner("Logging in to file server...", || {
            self.client.login(&self.config.credentials)
        })?;
        ui::with_spinner("Uploading archive...", || {
            self.client
                .upload(&session, &archive, &self.config.remote_dir)
        })?;
        Ok(archive)
    }
}
