//! Hook chain for parser configuration and command interception.
//!
//! Plugins let cross-cutting concerns (argument injection, call
//! interception, file-argument rewriting) live outside command bodies.
//! A plugin implements [`CommandHook`] for the extension points it cares
//! about and is registered on a [`HookRegistry`].
//!
//! # Extension points
//!
//! - `configure_parser`: side-effecting. Every registered plugin runs, in
//!   order, and may add options to a command's parser before arguments are
//!   parsed.
//! - `call_command`: value-returning. Implementations run in order and the
//!   first one returning [`Flow::Resolved`] determines the result. An
//!   implementation may perform the call itself (wrapping it with timing,
//!   retries, recording) or delegate to the next one.
//! - `handle_file_arg`: value-returning, chained like `call_command`.
//!   Rewrites a file-path argument (for example to a fetched local copy).
//!
//! # Ordering
//!
//! Plugins run in registration order. A plugin registered with
//! [`Placement::Last`] runs only after every normally-placed plugin has had
//! its turn, which is how the built-in identity defaults stay overridable.
//!
//! # Built-ins
//!
//! When the first command is attached and nothing is registered yet, the
//! registry auto-registers a defaults plugin providing two identity
//! implementations: `call_command` invokes the entry point directly, and
//! `handle_file_arg` returns its input unchanged.

use std::rc::Rc;

use clap::Command;

use crate::binder::Namespace;
use crate::dispatch::{CommandOutcome, MainFn};
use crate::error::ConfigError;

/// Result of one chained hook implementation.
#[derive(Debug)]
pub enum Flow<T> {
    /// The implementation produced the final result; the chain stops here.
    Resolved(T),
    /// The implementation defers to the next one in the chain.
    Delegate,
}

impl<T> Flow<T> {
    /// Returns true if this is a resolved result.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Flow::Resolved(_))
    }
}

/// Where a plugin runs relative to the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// Run in registration order, before any `Last` plugin.
    #[default]
    Normal,
    /// Run only after every `Normal` plugin has had its turn.
    Last,
}

/// A plugin contributing implementations of the framework's extension
/// points.
///
/// Every method except [`name`](CommandHook::name) has an identity or
/// delegating default, so a plugin implements only the points it cares
/// about.
///
/// # Example
///
/// ```rust
/// use switchyard::{CommandHook, CommandOutcome, Flow, MainFn, Namespace};
///
/// struct Timing;
///
/// impl CommandHook for Timing {
///     fn name(&self) -> &'static str {
///         "timing"
///     }
///
///     fn call_command(&self, main: &MainFn, args: &Namespace) -> Flow<CommandOutcome> {
///         let started = std::time::Instant::now();
///         let outcome = main(args);
///         log::info!("command finished in {:.2?}", started.elapsed());
///         Flow::Resolved(outcome)
///     }
/// }
/// ```
pub trait CommandHook {
    /// Stable identity, used for duplicate-prevention on registration.
    fn name(&self) -> &'static str;

    /// Adds options to a command's parser before arguments are parsed.
    fn configure_parser(&self, parser: Command) -> Command {
        parser
    }

    /// Intercepts a command invocation.
    fn call_command(&self, _main: &MainFn, _args: &Namespace) -> Flow<CommandOutcome> {
        Flow::Delegate
    }

    /// Transforms a file-path argument value.
    fn handle_file_arg(&self, _value: &str) -> Flow<String> {
        Flow::Delegate
    }
}

/// The identity defaults, auto-registered when nothing else is.
struct Builtins;

impl CommandHook for Builtins {
    fn name(&self) -> &'static str {
        "builtin-defaults"
    }

    fn call_command(&self, main: &MainFn, args: &Namespace) -> Flow<CommandOutcome> {
        Flow::Resolved(main(args))
    }

    fn handle_file_arg(&self, value: &str) -> Flow<String> {
        Flow::Resolved(value.to_string())
    }
}

struct Entry {
    plugin: Rc<dyn CommandHook>,
    placement: Placement,
}

/// An ordered collection of registered plugins.
///
/// Registration is idempotent per plugin identity: registering a name that
/// is already present is a no-op.
#[derive(Default)]
pub struct HookRegistry {
    entries: Vec<Entry>,
}

impl HookRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plugin with [`Placement::Normal`].
    ///
    /// Returns false (and changes nothing) if a plugin with the same name
    /// is already registered.
    pub fn register<H: CommandHook + 'static>(&mut self, plugin: H) -> bool {
        self.register_rc(Rc::new(plugin), Placement::Normal)
    }

    /// Registers a plugin that runs after every normally-placed one.
    pub fn register_last<H: CommandHook + 'static>(&mut self, plugin: H) -> bool {
        self.register_rc(Rc::new(plugin), Placement::Last)
    }

    fn register_rc(&mut self, plugin: Rc<dyn CommandHook>, placement: Placement) -> bool {
        if self.entries.iter().any(|e| e.plugin.name() == plugin.name()) {
            return false;
        }
        self.entries.push(Entry { plugin, placement });
        true
    }

    /// Names of the currently registered plugins, in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.plugin.name()).collect()
    }

    /// Returns true if no plugin is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registers the built-in identity defaults, but only if nothing else
    /// is registered yet. Safe to call repeatedly.
    pub(crate) fn ensure_builtins(&mut self) {
        if self.entries.is_empty() {
            self.register_last(Builtins);
        }
    }

    /// Plugins in invocation order: normal placements first (registration
    /// order), then the run-last ones.
    fn ordered(&self) -> impl Iterator<Item = &Rc<dyn CommandHook>> {
        let normal = self
            .entries
            .iter()
            .filter(|e| e.placement == Placement::Normal);
        let last = self
            .entries
            .iter()
            .filter(|e| e.placement == Placement::Last);
        normal.chain(last).map(|e| &e.plugin)
    }

    /// Runs `configure_parser` on every plugin, threading the parser
    /// through each.
    pub fn configure_parser(&self, parser: Command) -> Command {
        self.ordered()
            .fold(parser, |cmd, plugin| plugin.configure_parser(cmd))
    }

    /// Runs the `call_command` chain for `command`.
    ///
    /// The first implementation returning [`Flow::Resolved`] wins. An
    /// exhausted chain is a configuration error: it means a plugin
    /// displaced the built-in default and then every implementation
    /// delegated.
    pub fn call_command(
        &self,
        command: &str,
        main: &MainFn,
        args: &Namespace,
    ) -> Result<CommandOutcome, ConfigError> {
        for plugin in self.ordered() {
            if let Flow::Resolved(outcome) = plugin.call_command(main, args) {
                return Ok(outcome);
            }
        }
        Err(ConfigError::UnhandledCall(command.to_string()))
    }

    /// Runs the `handle_file_arg` chain. Falls back to the unchanged value
    /// if every implementation delegates.
    pub fn handle_file_arg(&self, value: &str) -> String {
        for plugin in self.ordered() {
            if let Flow::Resolved(rewritten) = plugin.handle_file_arg(value) {
                return rewritten;
            }
        }
        value.to_string()
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("plugins", &self.names())
            .finish()
    }
}
