use crate::{
    context::Context,
    event::{Event, EventHandled},
    helper::{split_message, MessageHelper},
    plugin::Plugin,
};
use anyhow::Result;
use serde_json::Value;

/// Discord caps messages at 2000 characters; leave room for the code block markup.
const CHUNK_SIZE: usize = 1500;

/// Raw Urban Rivals API queries, for the bot owner
pub struct Api;

#[serenity::async_trait]
impl Plugin for Api {
    fn name(&self) -> &'static str {
        "api"
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        let prefix = &ctx.cfg.read().await.general.command_prefix;
        Some(format!(
            "{}{} <call> [json params] - run an Urban Rivals API query (bot owner only)",
            prefix,
            self.name()
        ))
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Some((msg, args)) = event.is_bot_cmd(ctx, self.name()).await else {
            return Ok(EventHandled::No);
        };

        if !msg.is_from_owner(ctx).await {
            return Ok(EventHandled::Yes);
        }

        let Some((call, params)) = args.split_first() else {
            if let Some(usage) = self.usage(ctx).await {
                msg.reply(ctx.cache_http, format!("Usage: {}", usage)).await?;
            }
            return Ok(EventHandled::Yes);
        };

        let params = match params.join(" ").as_str() {
            "" => Value::Object(Default::default()),
            params => match serde_json::from_str::<Value>(params) {
                Ok(params) => params,
                Err(e) => {
                    msg.reply(ctx.cache_http, format!("Invalid JSON parameters: {}", e))
                        .await?;
                    return Ok(EventHandled::Yes);
                }
            },
        };

        let chunks: Vec<String> = match ctx.api.query(call, params).await {
            Ok(result) => split_message(&result.to_string(), CHUNK_SIZE)
                .into_iter()
                .map(|chunk| format!("```{}```", chunk))
                .collect(),
            Err(e) => split_message(&format!("{:#}", e), CHUNK_SIZE),
        };

        for chunk in chunks {
            msg.channel_id.say(ctx.http, chunk).await?;
        }
        Ok(EventHandled::Yes)
    }
}
