//! Confirmation and selection prompts
//!
//! Every interactive decision the manager needs goes through a
//! [`ConfirmationGateway`]. The CLI provides a terminal implementation;
//! [`ScriptedGateway`] replays recorded answers and [`AssumeYes`] accepts
//! every confirmation.

use pluginctl_core::{Error, Result};
use std::collections::VecDeque;
use tracing::debug;

/// Source of answers for confirmations and selections
pub trait ConfirmationGateway: Send {
    /// Ask a yes/no question
    ///
    /// `default` is the answer used when the user just presses enter.
    fn confirm(&mut self, question: &str, default: Option<bool>) -> Result<bool>;

    /// Pick one of `options`, returning its zero-based position
    fn choose(&mut self, prompt: &str, options: &[String]) -> Result<usize>;
}

/// Replays a queue of pre-recorded answers
#[derive(Debug, Default, Clone)]
pub struct ScriptedGateway {
    answers: VecDeque<String>,
}

impl ScriptedGateway {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
        }
    }

    /// A gateway with no answers; only defaulted confirmations succeed
    pub fn empty() -> Self {
        Self::default()
    }

    /// Answers not consumed yet
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl ConfirmationGateway for ScriptedGateway {
    fn confirm(&mut self, question: &str, default: Option<bool>) -> Result<bool> {
        let answer = self.answers.pop_front();
        debug!("Scripted answer for '{}': {:?}", question, answer);

        let unanswered = || Error::PromptUnanswered {
            prompt: question.to_string(),
        };

        match answer.as_deref().map(str::trim) {
            None | Some("") => default.ok_or_else(unanswered),
            Some(text) => match text.to_ascii_lowercase().as_str() {
                "yes" | "y" => Ok(true),
                "no" | "n" => Ok(false),
                _ => Err(Error::selection(format!(
                    "'{}' is not a valid answer to '{}', expected yes or no",
                    text, question
                ))),
            },
        }
    }

    fn choose(&mut self, prompt: &str, options: &[String]) -> Result<usize> {
        let answer = self
            .answers
            .pop_front()
            .ok_or_else(|| Error::PromptUnanswered {
                prompt: prompt.to_string(),
            })?;
        let answer = answer.trim();
        debug!("Scripted choice for '{}': {}", prompt, answer);

        if let Ok(index) = answer.parse::<usize>() {
            if index == 0 || index > options.len() {
                return Err(Error::selection(format!(
                    "index {} is out of range, expected 1 to {}",
                    index,
                    options.len()
                )));
            }
            return Ok(index - 1);
        }

        options
            .iter()
            .position(|option| option == answer)
            .ok_or_else(|| Error::selection(format!("'{}' does not match any option", answer)))
    }
}

/// Confirms everything; cannot choose
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

impl ConfirmationGateway for AssumeYes {
    fn confirm(&mut self, question: &str, _default: Option<bool>) -> Result<bool> {
        debug!("Assuming yes for '{}'", question);
        Ok(true)
    }

    fn choose(&mut self, prompt: &str, _options: &[String]) -> Result<usize> {
        Err(Error::PromptUnanswered {
            prompt: prompt.to_string(),
        })
    }
}
