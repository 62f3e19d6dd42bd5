use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use gw2walls::{logging, run, Outcome, Summary};

mod cli;

use crate::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    logging::init(cli.verbose);

    match download(&cli) {
        Ok(summary) => report(&summary),
        Err(err) => {
            eprintln!("gw2walls error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn download(cli: &Cli) -> Result<Summary> {
    let config = cli.config()?;
    let job = cli.job(&config);

    run(config.fetcher(), config.site(), &config.destination, &job)
        .with_context(|| format!("cannot save wallpapers to {}", config.destination.display()))
}

fn report(summary: &Summary) -> ExitCode {
    println!(
        "Cataloged {} wallpapers, {} matched, {} downloaded, {} failed.",
        summary.cataloged,
        summary.matched,
        summary.downloaded.len(),
        summary.failures.len()
    );

    for failure in &summary.failures {
        println!("  failed: {failure}");
    }

    match summary.outcome() {
        Outcome::Success => ExitCode::SUCCESS,
        Outcome::NoMatches => {
            eprintln!("No wallpapers matched.");
            ExitCode::from(1)
        }
        Outcome::AllFailed => ExitCode::from(2),
    }
}
