use anyhow::{Context, Result};
use language_profile::{Config, LanguageProfileAnalyzer, SqliteSignalStore};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize logging (stderr, so stdout stays valid JSON)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("language_profile=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;
    if config.is_in_memory() {
        info!("No LANGUAGE_PROFILE_DATABASE_URL set, the profile will be empty");
    }

    let store = SqliteSignalStore::connect(&config)
        .await
        .with_context(|| format!("Failed to open signal store at {}", config.database_url))?;

    let analyzer = LanguageProfileAnalyzer::new(Arc::new(store.clone()));
    let report = analyzer.report().await.context("Failed to read language profile")?;
    info!("Read {} signal rows", report.signals.len());

    println!("{}", serde_json::to_string_pretty(&report)?);

    store.close().await;
    Ok(())
}
