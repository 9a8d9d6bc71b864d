use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use twtfeed::app::AppContext;
use twtfeed::cli::{commands, Cli, Commands};
use twtfeed::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing; stdout is reserved for command output
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Commands::Hash { url, timestamp, text } = &cli.command {
        commands::hash_entry(url, timestamp, text);
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(workers) = cli.workers {
        config.fetch.workers = workers;
    }

    let ctx = AppContext::new(config)?;

    let cancel = ctx.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling fetches");
            cancel.cancel();
        }
    });

    match cli.command {
        Commands::View {
            source,
            label,
            format,
            warnings,
        } => {
            commands::view_feed(&ctx, &source, label, format, warnings).await?;
        }
        Commands::Timeline { limit, format } => {
            commands::show_timeline(&ctx, limit, format).await?;
        }
        Commands::Hash { .. } => {}
    }

    Ok(())
}
