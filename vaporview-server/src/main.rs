use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use vaporview_common::observability::{init_logging, LogConfig};
use vaporview_common::VaporConfigLoader;
use vaporview_scraper::StorefrontScraper;
use vaporview_server::{router, AppState};
use vaporview_store::ReviewStore;

#[derive(Debug, Parser)]
#[command(name = "vaporview", about = "Storefront review scraper service")]
struct Args {
    /// Config file; absent files fall back to defaults + env overrides.
    #[arg(long, default_value = "vaporview.yaml")]
    config: PathBuf,
    /// Mirror log events to stderr in addition to the file sink.
    #[arg(long)]
    log_stderr: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = VaporConfigLoader::new()
        .with_optional_file(&args.config)
        .load()?;

    let log_path = init_logging(LogConfig {
        emit_stderr: args.log_stderr,
        ..LogConfig::default()
    })?;
    tracing::info!(
        target: "server",
        config = %args.config.display(),
        log = %log_path.display(),
        "starting up"
    );

    let store = ReviewStore::open(&config.store.data_dir)?;
    let scraper = StorefrontScraper::new(config.browser.clone(), config.scrape.clone());
    let state = Arc::new(AppState {
        scraper: Arc::new(scraper),
        store: Mutex::new(store),
    });

    let listener = tokio::net::TcpListener::bind(&config.server.listen).await?;
    tracing::info!(target: "server", listen = %config.server.listen, "review scraper listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
