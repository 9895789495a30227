//! ftool: small file utilities built on the switchyard dispatch framework.

use std::process::ExitCode;

mod commands;

fn main() -> ExitCode {
    commands::cli().run()
}
