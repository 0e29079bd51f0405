use clap::Parser;
use droidsync::config::Cli;
use droidsync::Config;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("droidsync=info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    // Convert CLI args to Config - this validates immediately
    let config = Config::try_from(cli)?;

    let summary = droidsync::commands::sync::run(config)?;
    if summary.failed > 0 {
        // Failed files stay eligible for the next run; signal the shell.
        std::process::exit(1);
    }

    Ok(())
}
