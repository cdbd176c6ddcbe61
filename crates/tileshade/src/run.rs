use std::io::Write;

use anyhow::{Context, Result};
use cpurender::Viewer;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::FileConfig;

pub fn run(args: Cli) -> Result<()> {
    initialise_tracing();

    let config = FileConfig::discover(args.config.as_deref())
        .context("failed to load configuration")?
        .resolve(&args);
    tracing::debug!(?config, "resolved viewer configuration");

    let viewer = Viewer::new(config)?;
    match args.script.as_deref() {
        Some(script) => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            viewer.run_benchmark(script, &mut out)?;
            out.flush().context("failed to flush benchmark output")?;
            Ok(())
        }
        None => viewer.run_interactive(args.shader.clone()),
    }
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
