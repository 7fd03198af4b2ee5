//! Thin CLI entry point: parse arguments, build the engine config, and hand
//! off to the matching driver. All scanning logic lives in `strex::*`.

use std::fs::File;
use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;

use strex::cli::{build_config, Cli};
use strex::drivers::{FileScanner, ProcessScanner};
use strex::progress::{CancellationToken, ProgressReporter};
use strex::sink::TextSink;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let resolved = build_config(cli)?;

    let cancel = CancellationToken::new();
    let progress = ProgressReporter::new();

    match (&cli.target, cli.pid.is_empty()) {
        (None, true) => anyhow::bail!("specify a file/directory/glob target or at least one --pid"),
        (Some(_), false) => anyhow::bail!("--target and --pid are mutually exclusive"),
        _ => {}
    }

    let writer: Box<dyn Write + Send> = match &resolved.output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout()),
    };
    let sink = TextSink::new(writer);

    if let Some(target) = &cli.target {
        let files = FileScanner::expand(target, resolved.recurse)?;
        if files.is_empty() {
            anyhow::bail!("no files matched `{target}`");
        }
        let scanner = FileScanner::new(cancel, progress, resolved.parallel);
        scanner.run_all(&files, &resolved.decode, &resolved.request, resolved.filter.as_ref(), &sink, resolved.output.as_deref())?;
    } else {
        let scanner = ProcessScanner::new(cancel, progress, resolved.parallel);
        scanner.run_all(&cli.pid, resolved.memory_flags, &resolved.decode, &resolved.request, resolved.filter.as_ref(), &sink)?;
    }

    Ok(())
}
