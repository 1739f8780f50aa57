// UI layer: spinners around the slow network calls and credential prompts
// for interactive runs. CI runs never reach the prompts because stdin is
// not a terminal there.

use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use dialoguer::{Input, Password};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::{CredentialSource, NoPrompt};

/// Run `f` while a spinner shows `message` on stderr. The spinner is
/// cleared before returning, whatever the outcome.
pub fn with_spinner<T>(message: &'static str, f: impl FnOnce() -> T) -> T {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    let out = f();
    spinner.finish_and_clear();
    out
}

/// Asks for missing credentials on the terminal.
pub struct TerminalPrompt;

impl CredentialSource for TerminalPrompt {
    fn username(&mut self) -> Result<String> {
        let user: String = Input::new()
            .with_prompt("File server user")
            .interact_text()?;
        Ok(user)
    }

    fn password(&mut self, username: &str) -> Result<String> {
        let pwd = Password::new()
            .with_prompt(format!("Password for {username}"))
            .interact()?;
        Ok(pwd)
    }
}

/// Prompt when stdin is a terminal, refuse otherwise.
pub fn credential_source() -> Box<dyn CredentialSource> {
    if std::io::stdin().is_terminal() {
        Box::new(TerminalPrompt)
    } else {
        Box::new(NoPrompt)
    }
}

/// Final confirmation on stdout.
pub fn report_uploaded(archive: &Path) {
    println!("upload file success! file: {}", archive.display());
}
