use caviar_cli::Commands;
use caviar_core::SamplerConfig;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "caviar")]
#[command(about = "Sample partitions from the Ewens-Pitman attraction prior", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON configuration file (overridden by CAVIAR_* environment variables)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = SamplerConfig::load(cli.config.as_deref())?;

    if let Err(e) = caviar_utils::tracing::init(Some(&config.log_filter)) {
        eprintln!("warning: failed to initialise logging: {e}");
    }

    let output = cli.command.execute(&config)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
