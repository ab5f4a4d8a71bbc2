use dotenv::dotenv;
use std::sync::Arc;
use tokio::sync::oneshot;

mod ai;
mod channels;
mod config;
mod council;
mod db;
mod error;
mod models;
mod roster;
mod text;

use ai::CompletionClient;
use channels::{start_discord_listener, WarRoom};
use config::Config;
use council::Council;
use db::Database;
use roster::Roster;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;
    log::info!("Starting War Room with {:?}", config);

    let roster = Arc::new(Roster::load(&config.roster_path)?);
    log::info!(
        "Loaded roster from {} ({} active officers)",
        config.roster_path,
        roster.active_ids().len()
    );

    log::info!("Initializing database at {}", config.database_url);
    let db = Arc::new(Database::new(&config.database_url)?);
    let sync = db.upsert_officers(roster.officers())?;
    log::info!(
        "Roster synced: {} created, {} updated, {} retained",
        sync.created,
        sync.updated,
        sync.retained.len()
    );

    let client = CompletionClient::openrouter(
        &config.openrouter_api_key,
        &config.openrouter_endpoint,
        config.officer_timeout,
    )?;
    let council = Council::new(client, roster, Some(db.clone()), config.memory_max_tokens);
    let war_room = Arc::new(WarRoom::new(council, db, config.memory_max_tokens));

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                log::info!("Shutdown signal received");
                let _ = shutdown_tx.send(());
            }
            Err(e) => log::error!("Failed to listen for shutdown signal: {}", e),
        }
    });

    start_discord_listener(&config.discord_token, war_room, shutdown_rx).await?;
    log::info!("War Room stopped");
    Ok(())
}
