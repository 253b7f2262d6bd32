mod config;
mod context;
mod event;
mod handler;
mod helper;
mod logging;
mod plugin;
mod token_store;
mod trivia;
mod urban_rivals;
mod volatile_state;

use crate::{
    token_store::TokenStore,
    trivia::CharacterSource,
    urban_rivals::{ApiCharacterSource, TokenProvider, UrbanRivalsClient},
};
use serenity::{all::GatewayIntents, Client};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = crate::config::Config::load().await?;
    let token = cfg.general.discord_token.clone();
    let token_store = TokenStore::new(cfg.urban_rivals.token_path()?);
    let api: Arc<dyn TokenProvider> = Arc::new(UrbanRivalsClient::new(&cfg.urban_rivals));
    let characters: Arc<dyn CharacterSource> = Arc::new(ApiCharacterSource::new(api.clone()));
    let vstate = crate::volatile_state::VolatileState::new();
    let handler = handler::Handler::new(cfg, vstate, token_store, api, characters);

    // Things we want discord to tell us about.
    let intents = GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    Client::builder(&token, intents)
        .event_handler(handler)
        .await?
        .start()
        .await
        .map_err(Into::into)
}
