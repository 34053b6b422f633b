//! The interactive collaborator the workflow talks to
//!
//! The engine never reads a terminal or a file itself. Every question goes
//! through a [`Prompter`], and any answer may be a cancellation.

use secrecy::SecretString;
use thiserror::Error;

/// The user backed out of a prompt (EOF, interrupt, or an explicit "quit")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cancelled by user")]
pub struct Cancelled;

/// Result of a single prompt
pub type PromptResult<T> = Result<T, Cancelled>;

/// Source of user input for the wallet workflow
pub trait Prompter {
    /// Read a secret without echoing it (mnemonic, passphrases)
    fn prompt_secret(&mut self, label: &str) -> PromptResult<SecretString>;

    /// Yes/no question. `Ok(false)` is a "no", not a cancellation.
    fn prompt_confirmation(&mut self, label: &str) -> PromptResult<bool>;

    /// Pick one of `options`; returns its index
    fn prompt_choice(&mut self, label: &str, options: &[&str]) -> PromptResult<usize>;

    /// Obtain keystore JSON text. Where it comes from (file, paste) is up to
    /// the implementation.
    fn prompt_keystore(&mut self, label: &str) -> PromptResult<String>;

    /// Show a message that needs no answer
    fn notify(&mut self, message: &str);
}

impl<P: Prompter + ?Sized> Prompter for &mut P {
    fn prompt_secret(&mut self, label: &str) -> PromptResult<SecretString> {
        (**self).prompt_secret(label)
    }

    fn prompt_confirmation(&mut self, label: &str) -> PromptResult<bool> {
        (**self).prompt_confirmation(label)
    }

    fn prompt_choice(&mut self, label: &str, options: &[&str]) -> PromptResult<usize> {
        (**self).prompt_choice(label, options)
    }

    fn prompt_keystore(&mut self, label: &str) -> PromptResult<String> {
        (**self).prompt_keystore(label)
    }

    fn notify(&mut self, message: &str) {
        (**self).notify(message)
    }
}
