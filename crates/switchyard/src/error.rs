//! Error types for the dispatch framework.
//!
//! Failures fall into two tiers. [`ConfigError`] covers startup- and
//! registration-time contract violations (a malformed command list, a bad
//! parameter declaration); these are raised before any command runs and
//! never degrade silently. [`CmdError`] is the top-level result of a CLI
//! run and folds in parse errors and command failures.
//!
//! [`BadInput`] is the dedicated signal for "the user gave this command
//! invalid input". Command bodies raise it via [`check_input`] and it
//! propagates unchanged to the top level; scoped resources (the per-run
//! temp directory) are still released on the way out.

use std::path::PathBuf;
use thiserror::Error;

/// A startup- or registration-time configuration failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The command list is empty.
    #[error("the command list is empty")]
    EmptyCommandList,

    /// Two command descriptors share a name.
    #[error("duplicate command name: {0:?}")]
    DuplicateCommand(String),

    /// A command name is empty or contains whitespace.
    #[error("invalid command name: {0:?}")]
    InvalidName(String),

    /// An unnamed descriptor appeared in a multi-command list. Unnamed
    /// commands are only valid as the sole entry, where they collapse the
    /// CLI to a single flat parser.
    #[error("an unnamed command is only allowed as the sole entry of a command list")]
    UnnamedAmongMany,

    /// A declared parameter set contains a catch-all marker. Handlers must
    /// name every field they consume.
    #[error("catch-all parameter {0:?} is not supported; declare each field by name")]
    CatchAllParam(String),

    /// A declared parameter name is empty, contains whitespace, or repeats
    /// an earlier name.
    #[error("invalid parameter name: {0:?}")]
    InvalidParam(String),

    /// No entry point was attached for the selected command.
    #[error("no entry point attached for command {0:?}")]
    NoHandler(String),

    /// Every `call_command` implementation in the hook chain delegated.
    #[error("no hook resolved the command call for {0:?}")]
    UnhandledCall(String),

    /// A `--loglevel` value did not match any known level.
    #[error("unrecognized log level: {0:?}")]
    BadLogLevel(String),
}

/// Top-level failure from a CLI run.
#[derive(Debug, Error)]
pub enum CmdError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Argument parsing failed, or clap produced help/version display.
    /// Reported through [`clap::Error::exit`] so the standard usage-error
    /// path (message to stderr, non-zero status) is preserved.
    #[error(transparent)]
    Parse(#[from] clap::Error),

    /// The scoped temp directory could not be created.
    #[error("could not create temp directory under {}: {source}", .base.display())]
    TempDir {
        base: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The command body failed.
    #[error("{0:#}")]
    Command(anyhow::Error),
}

impl From<anyhow::Error> for CmdError {
    fn from(err: anyhow::Error) -> Self {
        CmdError::Command(err)
    }
}

/// Indicates that invalid input was given to a command.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct BadInput(pub String);

/// Checks input to a command, raising [`BadInput`] with `reason` unless
/// `condition` holds.
///
/// # Example
///
/// ```rust
/// use switchyard::check_input;
///
/// fn run(threads: i64) -> anyhow::Result<()> {
///     check_input(threads > 0, "threads must be positive")?;
///     Ok(())
/// }
/// ```
pub fn check_input(condition: bool, reason: impl Into<String>) -> Result<(), BadInput> {
    if condition {
        Ok(())
    } else {
        Err(BadInput(reason.into()))
    }
}
