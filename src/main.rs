use anyhow::Result;
use clap::Parser;
use pocket_invest::cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;

    let level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("pocket_invest={level},sqlx=warn").into()),
        )
        .with_writer(std::io::stderr)
        .init();

    cli.run(config).await
}
