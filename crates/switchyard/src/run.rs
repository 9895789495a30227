//! The top-level invocation controller.
//!
//! [`Cli`] ties everything together: it builds the parser tree from the
//! command list, applies the degenerate-help rewrites, parses the process
//! arguments, configures logging, scopes the per-run temp directory when
//! the command opted into one, and runs the selected command through the
//! dispatcher, normalizing its outcome into a process exit status.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::process::ExitCode;
//! use switchyard::{common_args, Cli, CommandSpec, CommonArg, Dispatcher, ParamSpec};
//! use clap::Command;
//!
//! fn parser_align(parser: Command, d: &mut Dispatcher) -> Command {
//!     let parser = common_args(parser, &[CommonArg::Threads(None), CommonArg::LogLevel(None)]);
//!     let params = ParamSpec::new(["threads"]).expect("static parameter list");
//!     d.attach_with_params(parser, params, |args| {
//!         log::info!("aligning with {} threads", args.get_i64("threads").unwrap_or(1));
//!         Ok(None)
//!     })
//! }
//!
//! fn main() -> ExitCode {
//!     Cli::new("Read alignment utilities.")
//!         .version(env!("CARGO_PKG_VERSION"))
//!         .command(CommandSpec::new("align", "Aligns reads.", parser_align))
//!         .run()
//! }
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::binder::Namespace;
use crate::command::{make_parser, validate_commands, CommandSpec, LogLevel};
use crate::dispatch::Dispatcher;
use crate::error::CmdError;
use crate::help;
use crate::hooks::{CommandHook, HookRegistry};
use crate::logging;
use crate::platform;
use crate::tmpdir::{proposed_name, JobContext, ScopedTempDir};

/// A whole multi-command (or single-command) CLI.
pub struct Cli {
    description: String,
    version: String,
    commands: Vec<CommandSpec>,
    registry: HookRegistry,
}

impl Cli {
    /// Starts a CLI description. `description` is shown at the top of the
    /// root help.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            version: "0.0.0".to_string(),
            commands: Vec::new(),
            registry: HookRegistry::new(),
        }
    }

    /// Sets the version reported by `--version` and the startup log line.
    /// Consumers normally pass `env!("CARGO_PKG_VERSION")`.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Adds one command.
    pub fn command(mut self, spec: CommandSpec) -> Self {
        self.commands.push(spec);
        self
    }

    /// Adds several commands at once.
    pub fn commands(mut self, specs: impl IntoIterator<Item = CommandSpec>) -> Self {
        self.commands.extend(specs);
        self
    }

    /// Registers a hook plugin. Plugins registered here run before the
    /// auto-registered built-in defaults.
    pub fn plugin<H: CommandHook + 'static>(mut self, plugin: H) -> Self {
        self.registry.register(plugin);
        self
    }

    /// Registers a hook plugin that runs only after every normally-placed
    /// plugin.
    pub fn plugin_last<H: CommandHook + 'static>(mut self, plugin: H) -> Self {
        self.registry.register_last(plugin);
        self
    }

    /// Parses `std::env::args` and runs the selected command, applying
    /// process-exit semantics: parse errors report through the parser's
    /// own error path, command failures print to stderr and exit non-zero.
    pub fn run(self) -> ExitCode {
        match self.run_from(env::args()) {
            Ok(code) => ExitCode::from((code & 0xff) as u8),
            Err(CmdError::Parse(err)) => err.exit(),
            Err(err) => {
                eprintln!("error: {err}");
                ExitCode::FAILURE
            }
        }
    }

    /// Runs against an explicit argument vector (`argv[0]` included) and
    /// returns the exit status instead of exiting. This is the testable
    /// core of [`run`](Self::run).
    pub fn run_from<I, T>(self, argv: I) -> Result<i32, CmdError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        let Cli {
            description,
            version,
            commands,
            registry,
        } = self;

        validate_commands(&commands)?;
        let single = commands.len() == 1 && commands[0].name.is_none();

        let argv0 = argv.first().cloned().unwrap_or_default();
        let prog = script_name(&argv0);

        let mut dispatcher = Dispatcher::with_registry(registry);
        let parser = make_parser(&prog, &commands, &description, &mut dispatcher)?;

        // Degenerate invocations become help requests: no arguments at all
        // shows the root help, a lone subcommand name shows that command's
        // help.
        let mut args = argv;
        if args.len() <= 1 {
            args = vec![argv0.clone(), "--help".to_string()];
        } else if args.len() == 2 && !single && names_command(&commands, &args[1]) {
            args.push("--help".to_string());
        }

        let mut help_parser = parser.clone();
        let matches = parser.try_get_matches_from(&args)?;

        if !single {
            if matches.get_flag("help") {
                print!("{}", help::subcommand_overview(&prog, &commands));
                println!();
                println!("{}", help_parser.render_help());
                return Ok(0);
            }
            if matches.get_flag("version") {
                println!("{version}");
                return Ok(0);
            }
        }

        let (command_field, dispatch_key, sub_matches) = if single {
            (String::new(), prog.clone(), &matches)
        } else {
            match matches.subcommand() {
                Some((name, sub)) => (name.to_string(), name.to_string(), sub),
                None => {
                    return Err(CmdError::Parse(help_parser.error(
                        clap::error::ErrorKind::MissingSubcommand,
                        "a subcommand is required",
                    )));
                }
            }
        };

        let mut ns = Namespace::from_matches(sub_matches);
        ns.insert("command", command_field.as_str());
        dispatcher.rewrite_file_args(sub_matches, &mut ns);

        // A command that opted into the version family short-circuits here,
        // before any logging or resource setup.
        if ns.get_bool("version") {
            println!("{version}");
            return Ok(0);
        }

        // Commands that skip --loglevel log everything.
        let level = match ns.get_str("loglevel") {
            Some(value) => value.parse::<LogLevel>()?,
            None => LogLevel::Debug,
        };
        logging::setup_logger(level);
        logging::log_invocation(&version, &argv0, &command_field, &ns);

        let outcome = match ns.get_str("tmp_dir").map(PathBuf::from) {
            Some(base) => {
                let job = JobContext::from_env();
                let prefix = proposed_name(&prog, &command_field, &job);
                let mut scoped = ScopedTempDir::create(&base, &prefix)
                    .map_err(|source| CmdError::TempDir { base, source })?;
                if ns.get_bool("tmp_dirKeep") || platform::keep_tmp() {
                    scoped.keep();
                }
                // The guard drops when this arm ends, removing or keeping
                // the directory on success and failure alike.
                dispatcher.dispatch(&dispatch_key, &ns)?
            }
            None => dispatcher.dispatch(&dispatch_key, &ns)?,
        };

        match outcome {
            Ok(status) => Ok(status.unwrap_or(0)),
            Err(err) => Err(CmdError::Command(err)),
        }
    }
}

impl std::fmt::Debug for Cli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cli")
            .field("description", &self.description)
            .field("version", &self.version)
            .field("commands", &self.commands)
            .field("registry", &self.registry)
            .finish()
    }
}

/// The invoking script's base name, without its extension.
fn script_name(argv0: &str) -> String {
    let base = Path::new(argv0)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| argv0.to_string());
    match base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => base,
    }
}

fn names_command(commands: &[CommandSpec], arg: &str) -> bool {
    commands
        .iter()
        .any(|spec| spec.name.as_deref() == Some(arg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_name_strips_path_and_extension() {
        assert_eq!(script_name("/usr/local/bin/ftool.py"), "ftool");
        assert_eq!(script_name("ftool"), "ftool");
        assert_eq!(script_name("./run.sh"), "run");
        assert_eq!(script_name(".hidden"), ".hidden");
    }

    #[test]
    fn test_names_command() {
        let commands = vec![CommandSpec::new("align", "", |parser, _| parser)];
        assert!(names_command(&commands, "align"));
        assert!(!names_command(&commands, "--version"));
        assert!(!names_command(&commands, "report"));
    }
}
