//! Interactive confirmations on the terminal

use dialoguer::{Confirm, Select};
use pluginctl_core::{Error, Result};
use pluginctl_manager::ConfirmationGateway;
use std::io;

/// Asks the user through dialoguer prompts
pub struct TerminalGateway;

fn prompt_failed(prompt: &str, err: dialoguer::Error) -> Error {
    Error::Io(io::Error::other(format!("prompt '{}' failed: {}", prompt, err)))
}

impl ConfirmationGateway for TerminalGateway {
    fn confirm(&mut self, question: &str, default: Option<bool>) -> Result<bool> {
        let mut confirm = Confirm::new().with_prompt(question);
        if let Some(default) = default {
            confirm = confirm.default(default);
        }
        confirm.interact().map_err(|e| prompt_failed(question, e))
    }

    fn choose(&mut self, prompt: &str, options: &[String]) -> Result<usize> {
        Select::new()
            .with_prompt(prompt)
            .items(options)
            .default(0)
            .interact()
            .map_err(|e| prompt_failed(prompt, e))
    }
}
