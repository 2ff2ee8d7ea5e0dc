//! SVQL command line
//!
//! Loads a pattern and a design, searches every design module for the
//! pattern and prints the matches as text or JSON.

mod args;

use std::process::ExitCode;

use clap::Parser;
use svql_common::{import_design, Config};
use svql_driver::{run_all_needles, run_query};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use args::Args;

fn main() -> ExitCode {
    let args = Args::parse();
    // the config file may turn on verbose logging too
    let config = args.to_config();
    let verbose = config.as_ref().map_or(args.verbose, |c| c.verbose);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level(verbose))))
        .with_writer(std::io::stderr)
        .with_thread_ids(true)
        .init();

    let result = match config {
        Ok(config) => run(&args, &config),
        Err(e) => Err(e.into()),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        },
    }
}

/// Default filter when `RUST_LOG` is unset.
fn log_level(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

fn run(args: &Args, config: &Config) -> Result<(), Box<dyn std::error::Error>> {

    info!("Loading pattern: {}", args.pattern.display());
    let needle = import_design(&args.pattern, &args.needle_options())?;
    info!("Loading design: {}", args.design.display());
    let haystack = import_design(&args.design, &args.haystack_options())?;

    if args.all_needles {
        let all = run_all_needles(&needle, &haystack, config)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&all)?);
        } else {
            for (name, matches) in &all {
                println!("== {name}: {} match(es)", matches.len());
                print!("{matches}");
            }
        }
        return Ok(());
    }

    let matches = run_query(&needle, &haystack, config)?;
    info!("Found {} match(es)", matches.len());
    if args.json {
        println!("{}", matches.to_json_string()?);
    } else {
        print!("{matches}");
        for (i, m) in matches.matches.iter().enumerate() {
            for loc in &m.sources {
                if !loc.is_empty() {
                    println!("Match #{i} source:\n{}", loc.to_string_pretty());
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_selects_debug() {
        assert_eq!(log_level(true), "debug");
        assert_eq!(log_level(false), "info");
    }
}
