// External build tool invocation. The tool runs inside the compile
// directory; this process keeps its own working directory.

use std::path::Path;
use std::process::{Command, ExitStatus};

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{PublishError, PublishResult};

/// Build tool command line: `<program> [clean] -project <project> -target <target>`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildTool {
    pub program: String,
    pub project: String,
    pub target: String,
}

impl Default for BuildTool {
    fn default() -> Self {
        BuildTool {
            program: "xcodebuild".into(),
            project: "DiiMediaKit.xcodeproj".into(),
            target: "DiiMediaKit_Mac".into(),
        }
    }
}

impl BuildTool {
    /// Arguments for the clean step.
    pub fn clean_args(&self) -> Vec<&str> {
        let mut args = vec!["clean"];
        args.extend(self.target_args());
        args
    }

    /// Arguments for the build step.
    pub fn build_args(&self) -> Vec<&str> {
        self.target_args()
    }

    fn target_args(&self) -> Vec<&str> {
        vec!["-project", self.project.as_str(), "-target", self.target.as_str()]
    }

    /// Clean then build inside `compile_dir`. A failing clean is only
    /// reported; a failing build is an error.
    pub fn clean_and_build(&self, compile_dir: &Path) -> PublishResult<()> {
        if !compile_dir.is_dir() {
            return Err(PublishError::MissingPath(compile_dir.to_path_buf()));
        }
        info!(dir = %compile_dir.display(), target = %self.target, "starting release build");

        let clean = self.clean_args();
        let status = run_tool(&self.program, &clean, compile_dir)?;
        if !status.success() {
            warn!(%status, "clean step failed, building anyway");
        }

        let build = self.build_args();
        let status = run_tool(&self.program, &build, compile_dir)?;
        if !status.success() {
            return Err(PublishError::CommandFailed {
                command: display_command(&self.program, &build),
                status,
            });
        }
        info!(target = %self.target, "build finished");
        Ok(())
    }
}

/// Run `program` with inherited stdio in `dir` and wait for it.
pub(crate) fn run_tool(program: &str, args: &[&str], dir: &Path) -> PublishResult<ExitStatus> {
    info!(command = %display_command(program, args), "running");
    Command::new(program)
        .args(args)
        .current_dir(dir)
        .status()
        .map_err(|source| PublishError::Spawn {
            program: program.to_string(),
            source,
        })
}

pub(crate) fn display_command(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}
