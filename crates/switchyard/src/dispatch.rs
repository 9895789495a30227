//! Command routing: stored entry points and hook-chain dispatch.
//!
//! The [`Dispatcher`] owns the hook registry and the map from command name
//! to stored entry point. Attaching a command wires the two together:
//! plugins get to configure the parser up front, and the stored callback
//! routes the eventual invocation through the `call_command` chain instead
//! of calling the entry point directly.

use std::collections::HashMap;
use std::rc::Rc;

use clap::{ArgMatches, Command};

use crate::binder::{bind, file_arg_ids, Namespace, ParamSpec};
use crate::error::ConfigError;
use crate::hooks::HookRegistry;

/// What a command body returns: an optional exit status.
///
/// `Ok(None)` is normalized to exit status 0 by the invocation controller;
/// `Ok(Some(n))` is passed through as the process exit status.
pub type CommandOutcome = anyhow::Result<Option<i32>>;

/// A stored command entry point.
pub type MainFn = Rc<dyn Fn(&Namespace) -> CommandOutcome>;

/// Routes invocations for a set of attached commands through the hook
/// chain.
#[derive(Default)]
pub struct Dispatcher {
    registry: HookRegistry,
    mains: HashMap<String, MainFn>,
}

impl Dispatcher {
    /// Creates a dispatcher with an empty hook registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dispatcher around an already-populated registry.
    pub fn with_registry(registry: HookRegistry) -> Self {
        Self {
            registry,
            mains: HashMap::new(),
        }
    }

    /// The hook registry.
    pub fn registry(&self) -> &HookRegistry {
        &self.registry
    }

    /// Mutable access to the hook registry, for registering plugins before
    /// commands are attached.
    pub fn registry_mut(&mut self) -> &mut HookRegistry {
        &mut self.registry
    }

    /// Attaches `main` as the parser's entry point.
    ///
    /// Loads the built-in hook plugins if nothing is registered yet, lets
    /// every plugin configure the parser, and stores a callback keyed by
    /// the parser's name. The eventual invocation goes through the
    /// `call_command` chain, so plugins can intercept or wrap it.
    pub fn attach<F>(&mut self, parser: Command, main: F) -> Command
    where
        F: Fn(&Namespace) -> CommandOutcome + 'static,
    {
        self.registry.ensure_builtins();
        let parser = self.registry.configure_parser(parser);
        self.mains
            .insert(parser.get_name().to_string(), Rc::new(main));
        parser
    }

    /// Like [`attach`](Self::attach), but `main` receives only the
    /// namespace fields named by `params` (the split-argument path).
    pub fn attach_with_params<F>(&mut self, parser: Command, params: ParamSpec, main: F) -> Command
    where
        F: Fn(&Namespace) -> CommandOutcome + 'static,
    {
        self.attach(parser, bind(params, main))
    }

    /// Returns true if an entry point is attached under `command`.
    pub fn is_attached(&self, command: &str) -> bool {
        self.mains.contains_key(command)
    }

    /// Routes every file-typed argument value in `ns` through the
    /// `handle_file_arg` chain.
    pub(crate) fn rewrite_file_args(&self, matches: &ArgMatches, ns: &mut Namespace) {
        for id in file_arg_ids(matches) {
            ns.rewrite_strings(&id, |value| self.registry.handle_file_arg(value));
        }
    }

    /// Runs the attached command through the `call_command` chain.
    pub fn dispatch(&self, command: &str, args: &Namespace) -> Result<CommandOutcome, ConfigError> {
        let main = self
            .mains
            .get(command)
            .ok_or_else(|| ConfigError::NoHandler(command.to_string()))?;
        self.registry.call_command(command, main, args)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut commands: Vec<&String> = self.mains.keys().collect();
        commands.sort();
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("commands", &commands)
            .finish()
    }
}
