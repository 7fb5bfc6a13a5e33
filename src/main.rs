#![forbid(unsafe_code)]

mod config;
mod constants;
mod lifecycle;
mod merge;
mod persistence;
mod projection;
mod server;
mod store;
mod sync;
mod types;

use actix_web::web;
use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

use config::{Cli, ServerConfig};
use persistence::ButtonFile;
use server::AppState;
use store::lock_store;

#[actix_web::main]
async fn main() -> Result<()> {
    let config = ServerConfig::from_cli(Cli::parse());

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;

    let file = ButtonFile::new(&config.data_file);
    let store = file.load_or_empty();
    info!(path = %file.path().display(), count = store.len(), "Loaded button store");

    let state = web::Data::new(AppState::new(store, file));
    server::run(&config, state.clone()).await?;

    let dirty = lock_store(&state.store)?.is_dirty();
    if config.save_on_exit && dirty {
        match state.file.save_store(&state.store) {
            Ok(count) => info!(count, "Saved buttons on exit"),
            Err(e) => error!(error = %e, "Failed to save buttons on exit"),
        }
    } else if dirty {
        info!("Exiting with unsaved changes (use --save-on-exit to keep them)");
    }
    Ok(())
}
