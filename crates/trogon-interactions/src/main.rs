use anyhow::Context;
use clap::Parser;
use trogon_interactions::env::SystemEnv;
use trogon_interactions::{
    BlobBackend, GcsBlobStore, InteractionsConfig, MemoryBlobStore, serve,
};

#[derive(Parser, Debug)]
#[command(name = "trogon-interactions", about = "Discord interactions webhook server")]
struct Args {
    /// Override INTERACTIONS_PORT
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config =
        InteractionsConfig::from_env(&SystemEnv).context("Invalid configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }

    match config.blob.clone() {
        BlobBackend::Gcs(gcs) => {
            let store = GcsBlobStore::new(gcs).context("Failed to build GCS client")?;
            serve(config, store).await.context("Server failed")?;
        }
        BlobBackend::Memory => {
            tracing::warn!("Using empty in-memory blob store; no media will be found");
            serve(config, MemoryBlobStore::new())
                .await
                .context("Server failed")?;
        }
    }

    Ok(())
}
