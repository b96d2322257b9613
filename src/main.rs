use gsim::{Engine, SimulationConfig};

use anyhow::{Context, Result};
use clap::Parser;

use std::io::{self, Write};
use std::path::PathBuf;

/// Direct-sum gravitational N-body run.
/// Run parameters come from the YAML file named by GSIM_CONFIG, if set.
#[derive(Parser, Debug)]
struct Args {
    /// Whitespace-separated x y z triples overriding the first particle positions
    seed_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let cfg = SimulationConfig::from_env().context("failed to load run configuration")?;

    let mut engine = Engine::new(cfg.parameters()).context("failed to set up engine")?;
    let overridden = engine.initialize(args.seed_file.as_deref())?;
    if overridden > 0 {
        log::info!("{overridden} particle position(s) taken from the seed file");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    engine
        .run(&mut out, &cfg.output)
        .context("simulation aborted")?;
    out.flush()?;

    Ok(())
}
