//! The enumerating help shown for the root parser.
//!
//! Instead of clap's single-level listing, `--help` on a multi-command CLI
//! first walks every registered subcommand, printing its invocation syntax
//! and a word-wrapped rendering of its description, and only then falls
//! through to the standard help text.

use crate::command::CommandSpec;

const WRAP_WIDTH: usize = 60;
const INDENT: &str = "     ";

/// Collapses runs of whitespace (line breaks, tabs, doubled spaces from
/// multi-line string literals) into single spaces.
pub(crate) fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Greedy word wrap at `width` columns.
pub(crate) fn fill(text: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if line.is_empty() {
            line.push_str(word);
        } else if line.len() + 1 + word.len() <= width {
            line.push(' ');
            line.push_str(word);
        } else {
            lines.push(std::mem::take(&mut line));
            line.push_str(word);
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines.join("\n")
}

/// Renders the per-subcommand overview printed before the standard help.
pub(crate) fn subcommand_overview(prog: &str, specs: &[CommandSpec]) -> String {
    let mut out = String::new();
    out.push_str("\nEnter a subcommand to view additional information:\n");

    for spec in specs {
        let name = match spec.name.as_deref() {
            Some(name) => name,
            None => continue,
        };
        out.push_str(&format!(
            "\n{INDENT}{prog} {} [...]\n",
            console::style(name).bold()
        ));

        let description = normalize(&spec.about);
        if description.is_empty() {
            continue;
        }
        let indent = INDENT.repeat(2);
        for line in fill(&description, WRAP_WIDTH).lines() {
            out.push_str(&indent);
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}
