mod cli;
mod conf;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use notemig_io_fs::migrate_tree;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const C_LOG_FILTER_DEFAULT: &str = "notemig=info,notemig_io_fs=info";

/// `RUST_LOG` when set, otherwise info level for both crates.
fn build_env_filter(log_filter_env: Option<&str>) -> Result<EnvFilter> {
    match log_filter_env {
        Some(c_filter) => EnvFilter::try_new(c_filter)
            .with_context(|| format!("Invalid {} value: {c_filter:?}", EnvFilter::DEFAULT_ENV)),
        None => Ok(EnvFilter::new(C_LOG_FILTER_DEFAULT)),
    }
}

fn init_tracing() -> Result<()> {
    let log_filter_env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(log_filter_env.as_deref())?)
        .init();
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let spec_conf = conf::load_conf(&cli.config, cli.import.clone(), cli.export.clone())
        .context("Failed to load configuration")?;
    info!(
        import = %spec_conf.path_dir_import.display(),
        export = %spec_conf.path_dir_export.display(),
        "Starting migration"
    );

    let report_mg = migrate_tree(cli.to_options(spec_conf)).context("Migration aborted")?;
    if report_mg.error_count() > 0 {
        warn!(
            "{} note(s) could not be read and were skipped",
            report_mg.error_count()
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialize logging: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
