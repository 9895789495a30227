//! Multi-command CLI dispatch with hook-based interception.
//!
//! `switchyard` turns a list of named subcommands into a single
//! executable: it builds the hierarchical clap parser, binds parsed
//! arguments to command entry points through declarative parameter
//! matching, and routes every invocation through an ordered, pluggable
//! hook chain that can add options, intercept calls, or rewrite file
//! arguments. Cross-cutting runtime concerns (logging setup, a scoped
//! per-run temp directory with guaranteed cleanup, exit-status
//! normalization) live in the framework so command bodies stay plain
//! functions.
//!
//! # Features
//!
//! - **Command registration**: `(name, builder)` pairs; one unnamed entry
//!   degenerates the CLI to a single flat parser
//! - **Declarative binding**: a handler names the fields it consumes and
//!   receives exactly those
//! - **Hook chain**: `configure_parser`, `call_command` and
//!   `handle_file_arg` extension points with overridable identity defaults
//! - **Scoped temp dirs**: opt-in `--tmp_dir`/`--tmp_dirKeep` per command,
//!   cluster-job-aware naming, removal on success and failure alike
//! - **Enumerating help**: root `--help` lists every subcommand with a
//!   word-wrapped description before the standard help text
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::process::ExitCode;
//! use clap::{Arg, Command};
//! use switchyard::{common_args, Cli, CommandSpec, CommonArg, Dispatcher, ParamSpec};
//!
//! fn parser_checksum(parser: Command, d: &mut Dispatcher) -> Command {
//!     let parser = parser.arg(Arg::new("input").required(true));
//!     let parser = common_args(parser, &[CommonArg::LogLevel(None)]);
//!     let params = ParamSpec::new(["input"]).expect("static parameter list");
//!     d.attach_with_params(parser, params, |args| {
//!         println!("{}", args.get_str("input").unwrap_or(""));
//!         Ok(None)
//!     })
//! }
//!
//! fn main() -> ExitCode {
//!     Cli::new("File utilities.")
//!         .version(env!("CARGO_PKG_VERSION"))
//!         .command(CommandSpec::new("checksum", "Digests files.", parser_checksum))
//!         .run()
//! }
//! ```

// Core modules
mod binder;
mod command;
mod dispatch;
mod error;
mod help;
mod hooks;
mod logging;
mod platform;
mod run;
mod tmpdir;

// Re-export core types
pub use binder::{bind, Namespace, ParamSpec};

pub use command::{common_args, BuildFn, CommandSpec, CommonArg, LogLevel};

pub use dispatch::{CommandOutcome, Dispatcher, MainFn};

pub use error::{check_input, BadInput, CmdError, ConfigError};

pub use hooks::{CommandHook, Flow, HookRegistry, Placement};

pub use platform::{find_tmp_dir, keep_tmp, KEEP_TMP_ENV};

pub use run::Cli;

pub use tmpdir::{proposed_name, JobContext, ScopedTempDir};
