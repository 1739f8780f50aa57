// Library root
// -----------
// This crate exposes the publishing workflow as a library. The binary
// (`main.rs`) parses the command line, sets up logging and maps errors to
// the process exit code.
//
// Module responsibilities:
// - `config`: command line, environment and config file resolution.
// - `build`: clean/build through the external build tool.
// - `version`: SDK version lookup in the C header.
// - `archive`: zip archive of the build output.
// - `api`: chfs file server login and upload.
// - `publisher`: runs the steps above in order.
// - `ui`: spinners and credential prompts.
pub mod api;
pub mod archive;
pub mod build;
pub mod config;
pub mod error;
pub mod publisher;
pub mod ui;
pub mod version;

pub use error::{PublishError, PublishResult};
pub use publisher::Publisher;
