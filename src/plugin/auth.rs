//! Authenticates the bot against the Urban Rivals API.
//!
//! On startup the stored access token is tried first.  Without a usable one, the owner receives an
//! authorization link in direct messages and answers with the verification code shown by the game
//! site.

use crate::{
    context::Context,
    event::{Event, EventHandled},
    log_internal,
    logging::{AsyncPrintColor, PrintColor},
    plugin::Plugin,
    urban_rivals::{Player, Token},
};
use anyhow::Result;
use serenity::all::{CreateMessage, Message};

pub struct Auth;

#[serenity::async_trait]
impl Plugin for Auth {
    fn name(&self) -> &'static str {
        "auth"
    }

    async fn usage(&self, _ctx: &Context) -> Option<String> {
        None
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        match event {
            Event::Ready(_) => {
                authenticate(ctx).await?;
                Ok(EventHandled::No)
            }
            Event::Message(msg) => verify(ctx, msg).await,
        }
    }
}

async fn authenticate(ctx: &Context<'_>) -> Result<()> {
    if let Some(token) = ctx.token_store.load().await {
        ctx.api.set_access_token(token).await;
        match ctx.api.logged_player().await {
            Ok(player) => {
                log_internal!("Authenticated on Urban Rivals as {}", player.color());
                return Ok(());
            }
            Err(e) => log_internal!("Stored access token was rejected: {:#}", e),
        }
    }

    let request_token = ctx.api.request_token().await?;
    let (owner_id, callback) = {
        let cfg = ctx.cfg.read().await;
        (cfg.general.owner_id, cfg.urban_rivals.callback_url.clone())
    };
    let url = ctx.api.authorize_url(&request_token, Some(&callback));
    ctx.vstate.write().await.auth.begin(request_token);

    let owner = owner_id.to_user(ctx.cache_http).await?;
    owner
        .direct_message(
            ctx.cache_http,
            CreateMessage::new().content(format!(
                "Please authorize me on Urban Rivals, then send me the verification code here.\n{}",
                url
            )),
        )
        .await?;

    log_internal!(
        "Sent the Urban Rivals authorization link to {}",
        owner_id.color(ctx.http).await
    );
    Ok(())
}

/// Treat a direct message from the owner as the verification code of the pending authorization.
async fn verify(ctx: &Context<'_>, msg: &Message) -> Result<EventHandled> {
    if msg.guild_id.is_some() {
        return Ok(EventHandled::No);
    }

    let Some(request_token) = ctx.vstate.read().await.auth.pending().cloned() else {
        return Ok(EventHandled::No);
    };

    {
        let cfg = ctx.cfg.read().await;
        if msg.author.id != cfg.general.owner_id
            || msg.content.starts_with(cfg.general.command_prefix.as_str())
        {
            return Ok(EventHandled::No);
        }
    }

    let verifier = msg.content.trim();
    if verifier.is_empty() {
        return Ok(EventHandled::No);
    }

    match exchange(ctx, &request_token, verifier).await {
        Ok((token, player)) => {
            ctx.vstate.write().await.auth.finish(&request_token);
            ctx.token_store.save(&token).await?;
            log_internal!("Authenticated on Urban Rivals as {}", player.color());
            msg.reply(
                ctx.cache_http,
                format!("Authenticated as **{}**", player.name),
            )
            .await?;
        }
        Err(e) => {
            log_internal!("Urban Rivals authorization failed: {:#}", e);
            msg.reply(ctx.cache_http, format!("Authorization failed: {:#}", e))
                .await?;
        }
    }

    Ok(EventHandled::Yes)
}

async fn exchange(
    ctx: &Context<'_>,
    request_token: &Token,
    verifier: &str,
) -> Result<(Token, Player)> {
    let token = ctx.api.access_token(request_token, verifier).await?;
    let player = ctx.api.logged_player().await?;
    Ok((token, player))
}
