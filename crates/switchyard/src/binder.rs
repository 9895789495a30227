//! Parsed-argument namespaces and declarative parameter binding.
//!
//! A [`Namespace`] is the per-invocation view of parsed arguments: a flat
//! map from option name to [`serde_json::Value`]. It is produced once from
//! clap's `ArgMatches`, carries the selected command name under the
//! `command` key, and flows through the hook chain to the command's entry
//! point.
//!
//! [`ParamSpec`] is the declarative side of argument binding: a handler
//! that only cares about a subset of the namespace names that subset at
//! registration time, and [`bind`] wraps it so the eventual call receives
//! exactly those fields. Catch-all declarations are rejected when the
//! declaration is constructed, long before any dispatch.

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use clap::ArgMatches;
use serde_json::Value;

use crate::dispatch::CommandOutcome;
use crate::error::ConfigError;

/// The parsed arguments of one invocation, as option name → value.
///
/// Values are scalars for single-occurrence options and arrays for
/// multi-value ones. Iteration order is the sorted option name, which
/// keeps log lines and tests deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Namespace {
    values: BTreeMap<String, Value>,
}

impl Namespace {
    /// Creates an empty namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a namespace from parsed matches.
    ///
    /// Recognizes the value types the framework's option families produce:
    /// `String`, `i64`, `bool` and `PathBuf`. Arguments carrying other
    /// downcast types are skipped.
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let mut ns = Namespace::new();
        for id in matches.ids() {
            if let Some(value) = extract(matches, id.as_str()) {
                ns.values.insert(id.to_string(), value);
            }
        }
        ns
    }

    /// Inserts a value, replacing any previous one under the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Returns the value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns the value under `name` as a string slice.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    /// Returns the value under `name` as an integer.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.values.get(name).and_then(Value::as_i64)
    }

    /// Returns the flag under `name`, treating a missing field as unset.
    pub fn get_bool(&self, name: &str) -> bool {
        self.values
            .get(name)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Returns the values under `name` as strings, accepting both a scalar
    /// and an array-valued field.
    pub fn get_strings(&self, name: &str) -> Vec<String> {
        match self.values.get(name) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect(),
            Some(Value::String(s)) => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    /// Returns true if a field named `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no fields are present.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over fields in sorted name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns a new namespace holding only the fields whose names appear
    /// in `names`. Names with no matching field are ignored.
    pub fn subset<S: AsRef<str>>(&self, names: &[S]) -> Namespace {
        let mut out = Namespace::new();
        for name in names {
            if let Some(value) = self.values.get(name.as_ref()) {
                out.values.insert(name.as_ref().to_string(), value.clone());
            }
        }
        out
    }

    /// Applies `rewrite` to the string content of the field named `name`
    /// (each element, for array-valued fields).
    pub(crate) fn rewrite_strings(&mut self, name: &str, rewrite: impl Fn(&str) -> String) {
        match self.values.get_mut(name) {
            Some(Value::String(s)) => *s = rewrite(s),
            Some(Value::Array(items)) => {
                for item in items.iter_mut() {
                    if let Value::String(s) = item {
                        *s = rewrite(s);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Extracts one argument's values, trying the downcast types the
/// framework's options use. One value becomes a scalar, several an array.
fn extract(matches: &ArgMatches, id: &str) -> Option<Value> {
    if let Ok(Some(vs)) = matches.try_get_many::<String>(id) {
        return Some(collect(vs.map(|s| Value::from(s.as_str()))));
    }
    if let Ok(Some(vs)) = matches.try_get_many::<i64>(id) {
        return Some(collect(vs.map(|n| Value::from(*n))));
    }
    if let Ok(Some(vs)) = matches.try_get_many::<bool>(id) {
        return Some(collect(vs.map(|b| Value::from(*b))));
    }
    if let Ok(Some(vs)) = matches.try_get_many::<PathBuf>(id) {
        return Some(collect(
            vs.map(|p| Value::from(p.to_string_lossy().into_owned())),
        ));
    }
    None
}

fn collect(values: impl Iterator<Item = Value>) -> Value {
    let mut all: Vec<Value> = values.collect();
    if all.len() == 1 {
        all.remove(0)
    } else {
        Value::Array(all)
    }
}

/// Returns the ids of the file-typed (`PathBuf`) arguments in `matches`.
pub(crate) fn file_arg_ids(matches: &ArgMatches) -> Vec<String> {
    matches
        .ids()
        .filter(|id| matches!(matches.try_get_many::<PathBuf>(id.as_str()), Ok(Some(_))))
        .map(|id| id.to_string())
        .collect()
}

/// The set of namespace fields a handler declares it consumes.
///
/// Construction validates the declaration: names must be non-empty,
/// whitespace-free and unique, and catch-all markers (`*`-prefixed, the
/// declarative analog of a variadic parameter) are rejected outright;
/// a handler that wants "everything" should take the namespace as-is via
/// [`Dispatcher::attach`](crate::Dispatcher::attach) instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    names: Vec<String>,
}

impl ParamSpec {
    /// Validates and builds a parameter declaration.
    ///
    /// # Errors
    ///
    /// [`ConfigError::CatchAllParam`] for `*`-prefixed names,
    /// [`ConfigError::InvalidParam`] for empty, whitespace-containing or
    /// duplicate names.
    pub fn new<I, S>(names: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for name in names {
            let name = name.into();
            if name.starts_with('*') {
                return Err(ConfigError::CatchAllParam(name));
            }
            if name.is_empty() || name.chars().any(char::is_whitespace) {
                return Err(ConfigError::InvalidParam(name));
            }
            if !seen.insert(name.clone()) {
                return Err(ConfigError::InvalidParam(name));
            }
            out.push(name);
        }
        Ok(Self { names: out })
    }

    /// The declared names, in declaration order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Wraps `main` so it is called with exactly the declared subset of the
/// namespace. Extra fields (the selected command name, logging options
/// the handler did not declare) are dropped before the call.
pub fn bind<F>(params: ParamSpec, main: F) -> impl Fn(&Namespace) -> CommandOutcome
where
    F: Fn(&Namespace) -> CommandOutcome,
{
    move |ns| main(&ns.subset(params.names()))
}
