//! uniform-outcomes CLI entry point

use anyhow::{Context, Result};
use std::io::IsTerminal;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uniform_outcomes::config::{cli::Cli, toml::build_config, validator::validate_config, Config};
use uniform_outcomes::output::{json, text};
use uniform_outcomes::simulation::runner::{run_method, MethodRun};
use uniform_outcomes::util::time::{format_duration, Timer};

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.debug);

    println!("uniform-outcomes v{}", env!("CARGO_PKG_VERSION"));
    println!("Fairness-biased randomized placement");
    println!();

    cli.validate()?;

    let config = build_config(&cli)?;
    validate_config(&config).context("Configuration validation failed")?;

    text::print_header(&config);

    if cli.dry_run {
        print_configuration(&config);
        println!("Dry run mode - configuration validated successfully");
        return Ok(());
    }

    let runs = run_all(&config)?;
    text::print_results(&runs, &config)?;

    if let Some(path) = &config.output.json {
        let report = json::build_report(&config, &runs);
        json::write_json_output(path, &report, true)?;
        println!("JSON report written to {}", path.display());
    }

    Ok(())
}

/// Logs go to stderr so reports on stdout stay clean
fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let ansi = std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none();
    tracing_subscriber::fmt()
        .with_ansi(ansi)
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .init();
}

/// Run every configured method in order
fn run_all(config: &Config) -> Result<Vec<MethodRun>> {
    let spec = config.spec()?;
    let e = &config.experiment;

    let mut runs = Vec::with_capacity(config.methods.len());
    for method in &config.methods {
        let timer = Timer::start();
        let run = run_method(method, &spec, e.seed, e.trials, config.runtime.threads)
            .with_context(|| format!("Method {} failed", text::method_label(method)))?;
        info!(
            method = %method.method,
            trials = e.trials,
            mean_spread = run.summary.mean_spread,
            elapsed = %format_duration(timer.elapsed()),
            "method finished"
        );
        runs.push(run);
    }
    Ok(runs)
}

fn print_configuration(config: &Config) {
    println!("Configuration:");
    println!("  Output:");
    println!("    Histogram bins: {}", config.output.bins);
    if let Some(path) = &config.output.json {
        println!("    JSON report: {}", path.display());
    }
    println!("  Runtime:");
    println!("    Threads: {}", config.runtime.threads);
    println!();
}
