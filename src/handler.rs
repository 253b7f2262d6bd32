use crate::{
    config::Config, context::Context, event::Event, token_store::TokenStore,
    trivia::CharacterSource, urban_rivals::TokenProvider, volatile_state::VolatileState,
};
use serenity::all::{Message, Ready};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Discord event handler
pub struct Handler {
    cfg: RwLock<Config>,
    vstate: RwLock<VolatileState>,
    token_store: TokenStore,
    api: Arc<dyn TokenProvider>,
    characters: Arc<dyn CharacterSource>,
}

impl<'a> Handler {
    pub fn new(
        cfg: Config,
        vstate: VolatileState,
        token_store: TokenStore,
        api: Arc<dyn TokenProvider>,
        characters: Arc<dyn CharacterSource>,
    ) -> Self {
        Self {
            cfg: RwLock::new(cfg),
            vstate: RwLock::new(vstate),
            token_store,
            api,
            characters,
        }
    }

    fn ctx(&'a self, discord_ctx: &'a serenity::all::Context) -> Context<'a> {
        Context {
            cfg: &self.cfg,
            vstate: &self.vstate,
            token_store: &self.token_store,
            api: &self.api,
            characters: &self.characters,
            cache: &discord_ctx.cache,
            http: &discord_ctx.http,
            cache_http: discord_ctx,
        }
    }
}

#[serenity::async_trait]
impl serenity::all::EventHandler for Handler {
    async fn ready(&self, discord_ctx: serenity::all::Context, ready: Ready) {
        Event::Ready(ready).handle(self.ctx(&discord_ctx)).await;
    }

    async fn message(&self, discord_ctx: serenity::all::Context, msg: Message) {
        Event::Message(msg).handle(self.ctx(&discord_ctx)).await;
    }
}
