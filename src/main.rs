mod app;
mod commands;
mod config;
mod errors;
mod extractor;
mod formats;
mod handlers;
mod health;
mod schema;
mod selection;
mod shortener;
mod store;
mod sweeper;
mod utils;

use std::sync::Arc;

use teloxide::prelude::*;

use crate::{
    app::App,
    config::{Config, SweepPolicy},
    schema::schema,
    selection::PendingSelections,
    shortener::{RebrandlyClient, UrlShortener},
    store::{FirebaseLinkStore, LinkStore},
};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    pretty_env_logger::init();
    log::info!("Starting smart link bot...");

    // Missing configuration is the only fatal error
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    let http = match reqwest::Client::builder()
        .timeout(config.upstream_timeout)
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            log::error!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let store: Arc<dyn LinkStore> = Arc::new(FirebaseLinkStore::new(
        http.clone(),
        &config.database_url,
        config.database_secret.clone(),
    ));
    let shortener: Arc<dyn UrlShortener> =
        Arc::new(RebrandlyClient::new(http, config.rebrandly_api_key.clone()));

    tokio::spawn(health::run(config.health_port));

    if config.sweep_policy == SweepPolicy::Interval {
        tokio::spawn(sweeper::run_interval(
            store.clone(),
            config.sweep_interval,
            config.retention_secs,
        ));
        log::info!("Expiry sweeper running every {:?}", config.sweep_interval);
    }

    let bot = Bot::new(&config.bot_token);
    let app = Arc::new(App {
        config,
        store,
        shortener,
        selections: PendingSelections::new(),
    });

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![app])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
