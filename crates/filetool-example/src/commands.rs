//! The ftool command set.
//!
//! Each command is a parser-builder function plus a plain entry point.
//! The builders opt into the common option families they need and declare
//! the namespace fields their entry points consume.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{value_parser, Arg, Command};
use serde::Serialize;
use sha2::{Digest, Sha256};
use switchyard::{
    check_input, common_args, Cli, CommandHook, CommandOutcome, CommandSpec, CommonArg,
    Dispatcher, Flow, MainFn, Namespace, ParamSpec,
};

/// Logs how long each command took, then hands back its outcome.
struct Timing;

impl CommandHook for Timing {
    fn name(&self) -> &'static str {
        "timing"
    }

    fn call_command(&self, main: &MainFn, args: &Namespace) -> Flow<CommandOutcome> {
        let started = std::time::Instant::now();
        let outcome = main(args);
        log::info!("command finished in {:.2?}", started.elapsed());
        Flow::Resolved(outcome)
    }
}

/// Builds the whole CLI.
pub fn cli() -> Cli {
    Cli::new("Small file utilities built on the switchyard dispatch framework.")
        .version(env!("CARGO_PKG_VERSION"))
        .plugin(Timing)
        .command(CommandSpec::new(
            "checksum",
            "Compute SHA-256 digests of the given files.  Reads each \
             input in full and prints one digest per line, in input order.",
            parser_checksum,
        ))
        .command(CommandSpec::new(
            "stage",
            "Copy inputs into the scoped working directory.  The \
             directory is removed when the command finishes unless \
             --tmp_dirKeep is given.",
            parser_stage,
        ))
}

fn parser_checksum(parser: Command, d: &mut Dispatcher) -> Command {
    let parser = parser.arg(
        Arg::new("inputs")
            .value_name("FILE")
            .num_args(1..)
            .required(true)
            .value_parser(value_parser!(PathBuf))
            .help("Files to digest"),
    );
    let parser = common_args(
        parser,
        &[
            CommonArg::Threads(None),
            CommonArg::LogLevel(None),
            CommonArg::Version,
        ],
    );
    let params = ParamSpec::new(["inputs", "threads"]).expect("static parameter list");
    d.attach_with_params(parser, params, checksum)
}

fn checksum(args: &Namespace) -> CommandOutcome {
    let inputs = args.get_strings("inputs");
    check_input(!inputs.is_empty(), "no input files given")?;
    let threads = args.get_i64("threads").unwrap_or(1).max(1) as usize;

    for (input, digest) in digest_all(&inputs, threads)? {
        println!("{digest}  {input}");
    }
    Ok(None)
}

/// Digests `inputs` across up to `threads` workers, preserving input order
/// in the result.
fn digest_all(inputs: &[String], threads: usize) -> anyhow::Result<Vec<(String, String)>> {
    let chunk_size = inputs
        .len()
        .div_ceil(threads.min(inputs.len()).max(1))
        .max(1);

    let collected: Vec<anyhow::Result<(String, String)>> = std::thread::scope(|scope| {
        let workers: Vec<_> = inputs
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|input| digest_one(input))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        workers
            .into_iter()
            .flat_map(|worker| match worker.join() {
                Ok(results) => results,
                Err(_) => vec![Err(anyhow::anyhow!("digest worker panicked"))],
            })
            .collect()
    });

    collected.into_iter().collect()
}

fn digest_one(input: &str) -> anyhow::Result<(String, String)> {
    let mut file =
        fs::File::open(input).with_context(|| format!("could not open {input}"))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)
        .with_context(|| format!("could not read {input}"))?;
    Ok((input.to_string(), hex::encode(hasher.finalize())))
}

fn parser_stage(parser: Command, d: &mut Dispatcher) -> Command {
    let parser = parser.arg(
        Arg::new("inputs")
            .value_name("FILE")
            .num_args(1..)
            .required(true)
            .value_parser(value_parser!(PathBuf))
            .help("Files to copy into the working directory"),
    );
    let parser = common_args(parser, &[CommonArg::TmpDir, CommonArg::LogLevel(None)]);
    let params = ParamSpec::new(["inputs"]).expect("static parameter list");
    d.attach_with_params(parser, params, stage)
}

#[derive(Debug, Serialize)]
struct StageSummary {
    workspace: String,
    staged: Vec<String>,
}

fn stage(args: &Namespace) -> CommandOutcome {
    let inputs = args.get_strings("inputs");
    check_input(!inputs.is_empty(), "no input files given")?;

    // The framework publishes the scoped directory through TMPDIR before
    // the command runs.
    let workspace =
        PathBuf::from(env::var("TMPDIR").context("no working directory available")?);

    let mut staged = Vec::new();
    for input in &inputs {
        let source = Path::new(input);
        check_input(source.is_file(), format!("input does not exist: {input}"))?;
        let name = source
            .file_name()
            .with_context(|| format!("input has no file name: {input}"))?;
        let dest = workspace.join(name);
        fs::copy(source, &dest).with_context(|| format!("could not stage {input}"))?;
        staged.push(dest.display().to_string());
    }

    let summary = StageSummary {
        workspace: workspace.display().to_string(),
        staged,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(None)
}
