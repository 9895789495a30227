//! Command descriptors, the parser builder, and common option families.
//!
//! A CLI is described as a list of [`CommandSpec`]s: each pairs a
//! subcommand name with a one-line description and a builder function that
//! fills in the subcommand's parser and attaches its entry point. A single
//! [`CommandSpec::unnamed`] entry collapses the whole thing to a flat,
//! single-command parser.
//!
//! [`common_args`] injects the option families most commands share
//! (`--tmp_dir`/`--tmp_dirKeep`, `--loglevel`, `--threads`, `--version`);
//! each family is opt-in per command.

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use clap::builder::PossibleValuesParser;
use clap::{value_parser, Arg, ArgAction, Command};

use crate::dispatch::Dispatcher;
use crate::error::ConfigError;
use crate::platform;

/// Environment flag marking a documentation-generation build, where
/// undocumented commands get a blank placeholder help string instead of
/// none at all.
const DOCS_ENV: &str = "READTHEDOCS";

/// Builder function for one subcommand: receives the bare parser and the
/// dispatcher, returns the configured parser (normally the result of
/// [`Dispatcher::attach`]).
pub type BuildFn = Rc<dyn Fn(Command, &mut Dispatcher) -> Command>;

/// One subcommand: name, one-line description, parser builder.
#[derive(Clone)]
pub struct CommandSpec {
    pub(crate) name: Option<String>,
    pub(crate) about: String,
    pub(crate) build: BuildFn,
}

impl CommandSpec {
    /// A named subcommand.
    pub fn new<F>(name: impl Into<String>, about: impl Into<String>, build: F) -> Self
    where
        F: Fn(Command, &mut Dispatcher) -> Command + 'static,
    {
        Self {
            name: Some(name.into()),
            about: about.into(),
            build: Rc::new(build),
        }
    }

    /// The sole command of a single-command CLI. Only valid as the only
    /// entry of the command list.
    pub fn unnamed<F>(build: F) -> Self
    where
        F: Fn(Command, &mut Dispatcher) -> Command + 'static,
    {
        Self {
            name: None,
            about: String::new(),
            build: Rc::new(build),
        }
    }

    /// The help string shown for this command in subcommand listings.
    ///
    /// Falls back to a blank placeholder under documentation-generation
    /// builds so listing tools do not render "undocumented".
    pub(crate) fn help_str(&self) -> Option<String> {
        if !self.about.trim().is_empty() {
            return Some(self.about.clone());
        }
        if std::env::var_os(DOCS_ENV).is_some() {
            return Some("   ".to_string());
        }
        None
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("about", &self.about)
            .finish_non_exhaustive()
    }
}

/// Validates a command list: names must be unique, non-empty and free of
/// whitespace, and an unnamed entry is only allowed on its own.
pub(crate) fn validate_commands(specs: &[CommandSpec]) -> Result<(), ConfigError> {
    if specs.is_empty() {
        return Err(ConfigError::EmptyCommandList);
    }
    if specs.len() == 1 && specs[0].name.is_none() {
        return Ok(());
    }

    let mut seen = HashSet::new();
    for spec in specs {
        let name = match &spec.name {
            Some(name) => name,
            None => return Err(ConfigError::UnnamedAmongMany),
        };
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidName(name.clone()));
        }
        if !seen.insert(name.clone()) {
            return Err(ConfigError::DuplicateCommand(name.clone()));
        }
    }
    Ok(())
}

/// Builds the full parser tree for a command list.
///
/// With a single unnamed entry the builder's own parser is returned
/// directly and the CLI degenerates to a flat single-command one. With
/// named entries the root parser carries the overall description, a custom
/// `--help` (rendered by the enumerating help path) and `--version`, plus
/// one subparser per command.
pub(crate) fn make_parser(
    prog: &str,
    specs: &[CommandSpec],
    description: &str,
    dispatcher: &mut Dispatcher,
) -> Result<Command, ConfigError> {
    validate_commands(specs)?;

    if specs.len() == 1 && specs[0].name.is_none() {
        return Ok((specs[0].build)(Command::new(prog.to_string()), dispatcher));
    }

    let mut root = Command::new(prog.to_string())
        .about(description.to_string())
        .override_usage(format!("{prog} <subcommand> [...]"))
        .disable_help_flag(true)
        .disable_version_flag(true)
        .disable_help_subcommand(true)
        .arg(
            Arg::new("help")
                .long("help")
                .short('h')
                .action(ArgAction::SetTrue)
                .hide(true),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .short('V')
                .action(ArgAction::SetTrue)
                .hide(true),
        );

    for spec in specs {
        let name = match &spec.name {
            Some(name) => name.clone(),
            None => return Err(ConfigError::UnnamedAmongMany),
        };
        let mut child = Command::new(name);
        if let Some(help) = spec.help_str() {
            child = child.about(help);
        }
        root = root.subcommand((spec.build)(child, dispatcher));
    }
    Ok(root)
}

/// Log verbosity choices, as accepted by `--loglevel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
    Exception,
}

impl LogLevel {
    /// The accepted spellings, in `--loglevel` choice order.
    pub const CHOICES: [&'static str; 6] = [
        "DEBUG",
        "INFO",
        "WARNING",
        "ERROR",
        "CRITICAL",
        "EXCEPTION",
    ];

    /// The canonical spelling of this level.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
            LogLevel::Exception => "EXCEPTION",
        }
    }

    /// The `log` filter this level maps to. `CRITICAL` and `EXCEPTION`
    /// share the error tier, which is as severe as the `log` crate gets.
    pub fn to_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warning => log::LevelFilter::Warn,
            LogLevel::Error | LogLevel::Critical | LogLevel::Exception => log::LevelFilter::Error,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            "CRITICAL" => Ok(LogLevel::Critical),
            "EXCEPTION" => Ok(LogLevel::Exception),
            _ => Err(ConfigError::BadLogLevel(s.to_string())),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opt-in families of common options.
#[derive(Debug, Clone)]
pub enum CommonArg {
    /// `--tmp_dir <DIR>` (base directory for temp files, defaulting to the
    /// platform temp root) plus the `--tmp_dirKeep` retention flag.
    TmpDir,
    /// `--loglevel`, with an optional non-INFO default.
    LogLevel(Option<LogLevel>),
    /// `--threads <N>`; `None` defaults to all available cores.
    Threads(Option<i64>),
    /// Per-command `--version`/`-V`.
    Version,
}

/// Adds the requested common option families to a command's parser.
pub fn common_args(parser: Command, args: &[CommonArg]) -> Command {
    let mut parser = parser;
    for arg in args {
        parser = match arg {
            CommonArg::TmpDir => parser
                .arg(
                    Arg::new("tmp_dir")
                        .long("tmp_dir")
                        .value_name("DIR")
                        .default_value(platform::find_tmp_dir().into_os_string())
                        .help("Base directory for temp files"),
                )
                .arg(
                    Arg::new("tmp_dirKeep")
                        .long("tmp_dirKeep")
                        .action(ArgAction::SetTrue)
                        .help(
                            "Keep the per-run temp directory instead of deleting it \
                             at the end, even if the command fails",
                        ),
                ),
            CommonArg::LogLevel(default) => {
                let default = default.unwrap_or(LogLevel::Info);
                parser.arg(
                    Arg::new("loglevel")
                        .long("loglevel")
                        .value_parser(PossibleValuesParser::new(LogLevel::CHOICES))
                        .default_value(default.as_str())
                        .help("Verboseness of output"),
                )
            }
            CommonArg::Threads(default) => {
                let (value, help) = match default {
                    Some(n) => (n.to_string(), format!("Number of threads (default: {n})")),
                    None => (
                        available_cores().to_string(),
                        "Number of threads (default: all available cores)".to_string(),
                    ),
                };
                parser.arg(
                    Arg::new("threads")
                        .long("threads")
                        .value_parser(value_parser!(i64))
                        .default_value(value)
                        .help(help),
                )
            }
            CommonArg::Version => parser.arg(
                Arg::new("version")
                    .long("version")
                    .short('V')
                    .action(ArgAction::SetTrue)
                    .help("Print version information and exit"),
            ),
        };
    }
    parser
}

fn available_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::Namespace;
    use serial_test::serial;

    fn noop_spec(name: &str) -> CommandSpec {
        CommandSpec::new(name, format!("The {name} command."), |parser, d| {
            d.attach(parser, |_ns: &Namespace| Ok(None))
        })
    }

    #[test]
    fn test_single_unnamed_returns_own_parser() {
        let specs = vec![CommandSpec::unnamed(|parser, d| {
            let parser = parser.arg(Arg::new("input").required(true));
            d.attach(parser, |_ns: &Namespace| Ok(None))
        })];

        let mut dispatcher = Dispatcher::new();
        let parser = make_parser("onecmd", &specs, "unused", &mut dispatcher).unwrap();

        assert_eq!(parser.get_name(), "onecmd");
        assert_eq!(parser.get_subcommands().count(), 0);
        let ids: Vec<String> = parser
            .get_arguments()
            .map(|a| a.get_id().to_string())
            .collect();
        assert!(ids.contains(&"input".to_string()));
    }

    #[test]
    fn test_multi_command_accepts_each_name() {
        let specs = vec![noop_spec("align"), noop_spec("report")];
        let mut dispatcher = Dispatcher::new();
        let parser = make_parser("tool", &specs, "desc", &mut dispatcher).unwrap();

        for name in ["align", "report"] {
            assert!(parser
                .clone()
                .try_get_matches_from(["tool", name])
                .is_ok());
        }
    }

    #[test]
    fn test_multi_command_rejects_unknown_name() {
        let specs = vec![noop_spec("align"), noop_spec("report")];
        let mut dispatcher = Dispatcher::new();
        let parser = make_parser("tool", &specs, "desc", &mut dispatcher).unwrap();

        let err = parser
            .try_get_matches_from(["tool", "frobnicate"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidSubcommand);
    }

    #[test]
    fn test_unnamed_among_many_is_rejected() {
        let specs = vec![
            noop_spec("align"),
            CommandSpec::unnamed(|parser, d| d.attach(parser, |_ns: &Namespace| Ok(None))),
        ];
        assert!(matches!(
            validate_commands(&specs),
            Err(ConfigError::UnnamedAmongMany)
        ));
    }

    #[test]
    fn test_duplicate_and_malformed_names_rejected() {
        assert!(matches!(
            validate_commands(&[noop_spec("align"), noop_spec("align")]),
            Err(ConfigError::DuplicateCommand(_))
        ));
        assert!(matches!(
            validate_commands(&[noop_spec("has space"), noop_spec("other")]),
            Err(ConfigError::InvalidName(_))
        ));
        assert!(matches!(
            validate_commands(&[noop_spec(""), noop_spec("other")]),
            Err(ConfigError::InvalidName(_))
        ));
        assert!(matches!(
            validate_commands(&[]),
            Err(ConfigError::EmptyCommandList)
        ));
    }

    #[test]
    #[serial]
    fn test_help_str_docs_fallback() {
        let undocumented = CommandSpec::new("align", "", |parser, _| parser);

        std::env::remove_var(DOCS_ENV);
        assert_eq!(undocumented.help_str(), None);

        std::env::set_var(DOCS_ENV, "True");
        assert_eq!(undocumented.help_str(), Some("   ".to_string()));
        std::env::remove_var(DOCS_ENV);

        let documented = CommandSpec::new("align", "Aligns reads.", |parser, _| parser);
        assert_eq!(documented.help_str(), Some("Aligns reads.".to_string()));
    }

    #[test]
    fn test_common_args_tmp_dir_family() {
        let parser = common_args(Command::new("align"), &[CommonArg::TmpDir]);
        let matches = parser.try_get_matches_from(["align"]).unwrap();

        // Default base comes from the platform lookup; the keep flag is off.
        assert!(matches.get_one::<String>("tmp_dir").is_some());
        assert!(!matches.get_flag("tmp_dirKeep"));
    }

    #[test]
    fn test_common_args_loglevel_choices() {
        let parser = common_args(Command::new("align"), &[CommonArg::LogLevel(None)]);

        let matches = parser
            .clone()
            .try_get_matches_from(["align", "--loglevel", "WARNING"])
            .unwrap();
        assert_eq!(
            matches.get_one::<String>("loglevel").map(String::as_str),
            Some("WARNING")
        );

        let err = parser
            .try_get_matches_from(["align", "--loglevel", "CHATTY"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn test_common_args_threads_default_and_override() {
        let parser = common_args(Command::new("align"), &[CommonArg::Threads(Some(2))]);

        let matches = parser.clone().try_get_matches_from(["align"]).unwrap();
        assert_eq!(matches.get_one::<i64>("threads"), Some(&2));

        let matches = parser
            .try_get_matches_from(["align", "--threads", "8"])
            .unwrap();
        assert_eq!(matches.get_one::<i64>("threads"), Some(&8));
    }

    #[test]
    fn test_loglevel_parse_and_filter() {
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert!(matches!(
            "CHATTY".parse::<LogLevel>(),
            Err(ConfigError::BadLogLevel(_))
        ));

        assert_eq!(LogLevel::Debug.to_filter(), log::LevelFilter::Debug);
        assert_eq!(LogLevel::Warning.to_filter(), log::LevelFilter::Warn);
        assert_eq!(LogLevel::Critical.to_filter(), log::LevelFilter::Error);
        assert_eq!(LogLevel::Exception.to_filter(), log::LevelFilter::Error);
    }
}
