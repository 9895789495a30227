//! Process-wide logging setup.
//!
//! One sink per process, installed the first time a command runs and never
//! torn down. The line format is fixed:
//! `<timestamp> - <module>:<line> - <LEVEL> - <message>`.

use std::io::Write;

use serde_json::Value;

use crate::binder::Namespace;
use crate::command::LogLevel;

/// Installs the process-wide log sink at the given level.
///
/// Safe to call more than once; only the first call configures the sink.
pub(crate) fn setup_logger(level: LogLevel) {
    let result = env_logger::Builder::new()
        .filter_level(level.to_filter())
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {}:{} - {} - {}",
                buf.timestamp_seconds(),
                record.module_path().unwrap_or("?"),
                record.line().unwrap_or(0),
                record.level(),
                record.args()
            )
        })
        .try_init();
    // Err means a sink is already installed, which is exactly the
    // load-once behavior wanted here.
    drop(result);
}

/// Emits the informational startup lines: software version, then the full
/// invocation (command plus every argument name/value pair).
pub(crate) fn log_invocation(version: &str, argv0: &str, command: &str, ns: &Namespace) {
    log::info!("software version: {version}");
    log::info!(
        "command: {argv0} {command} {}",
        render_invocation(ns)
    );
}

/// Renders the namespace as space-separated `name=value` pairs, skipping
/// internal fields.
pub(crate) fn render_invocation(ns: &Namespace) -> String {
    ns.iter()
        .filter(|(name, _)| *name != "command")
        .map(|(name, value)| format!("{name}={}", display_value(value)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
