//! chub - Package a Python wheel and its dependencies into a .chub archive
//!
//! The archive bundles the primary wheel(s), their dependency wheels,
//! install scripts, and extra files together with a manifest recording the
//! resolved compatibility targets.

use chub::cli::CliArgs;
use chub::output::{create_formatter, OutputConfig};
use chub::packager::Packager;
use clap::Parser;
use std::io::{self, Write};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    if args.verbose {
        eprintln!("chub v{}", env!("CARGO_PKG_VERSION"));
        if args.dry_run {
            eprintln!("Mode: dry-run");
        }
        if args.analyze_compatibility {
            eprintln!("Mode: analyze-compatibility");
        }
    }

    let output_config = OutputConfig::from_cli(args.json, args.verbose, args.quiet, args.dry_run);
    let packager = Packager::new(args)?;
    let outcome = packager.run().await?;

    let formatter = create_formatter(output_config);
    let mut stdout = io::stdout().lock();
    match &outcome.build {
        Some(build) => formatter.format_build(build, &mut stdout)?,
        None => formatter.format_analysis(&outcome.analysis, &mut stdout)?,
    }
    stdout.flush()?;

    Ok(ExitCode::SUCCESS)
}
