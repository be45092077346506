use anyhow::Context;
use clap::Parser;

use at_config::TrackerConfig;

mod cli;
mod commands;
mod output;
mod script;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("atrack error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let flags = cli.global_flags();

    match cli.command {
        cli::Commands::Schema => {
            init_tracing(flags.quiet, flags.verbose)?;
            commands::schema::handle(&flags)
        }
        cli::Commands::Config => commands::config::handle(&bootstrap(&flags)?),
        cli::Commands::Identity => commands::identity::handle(&bootstrap(&flags)?, &flags),
        cli::Commands::Replay(args) => {
            let config = bootstrap(&flags)?;
            commands::replay::handle(&args, config, &flags).await
        }
    }
}

/// Load configuration, then install logging (config can turn on debug).
fn bootstrap(flags: &cli::GlobalFlags) -> anyhow::Result<TrackerConfig> {
    let config =
        TrackerConfig::load_with_dotenv().context("failed to load tracker configuration")?;
    init_tracing(flags.quiet, flags.verbose || config.general.debug)?;
    Ok(config)
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("ACTION_TRACKER_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
