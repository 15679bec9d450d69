use dialoguer::Confirm;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("could not read answer to {question:?}: {source}")]
    Read {
        question: String,
        #[source]
        source: dialoguer::Error,
    },
}

/// Asks the user a yes/no question. Anything but an explicit yes is `false`.
pub trait Prompter {
    fn confirm(&mut self, question: &str) -> Result<bool, PromptError>;
}

/// Reads the answer from the controlling terminal.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&mut self, question: &str) -> Result<bool, PromptError> {
        Confirm::new()
            .with_prompt(question)
            .default(false)
            .interact()
            .map_err(|source| PromptError::Read {
                question: question.to_string(),
                source,
            })
    }
}
