//! CLI entry point for bnd-cs.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

/// Generate layout-exact C# bindings from a C type model.
#[derive(Parser, Debug)]
#[command(name = "bnd-cs", version, about)]
struct Cli {
    /// Path to the bnd-cs.toml configuration file.
    #[arg(default_value = "bnd-cs.toml")]
    config: PathBuf,

    /// Output file path (overrides config).
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("bnd_cs=info")),
        )
        .init();

    let cli = Cli::parse();
    bnd_cs::run(&cli.config, cli.output.as_deref())?;
    Ok(())
}
