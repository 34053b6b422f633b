//! Interactive workflow for creating and importing Ethereum accounts
//!
//! The [`WorkflowEngine`] walks a single pass from an offline check through
//! mnemonic generation, mnemonic restore, or keystore decryption, to a
//! [`WalletReport`]. All user interaction goes through a [`Prompter`], so
//! the same engine drives the terminal binary and scripted tests.

pub mod config;
pub mod engine;
pub mod prompt;
pub mod report;
pub mod terminal;

pub use config::{ConfigError, LogFormat, WalletConfig, EXIT_CONFIG_ERROR};
pub use engine::{Mode, Outcome, WorkflowEngine, WorkflowError, WorkflowState};
pub use prompt::{Cancelled, PromptResult, Prompter};
pub use report::WalletReport;
pub use terminal::{render_report, TerminalPrompter};
