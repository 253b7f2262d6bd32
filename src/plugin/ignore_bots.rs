use crate::{
    context::Context,
    event::{Event, EventHandled},
    plugin::Plugin,
};
use anyhow::Result;

/// Swallows messages from bots and webhooks, the bot's own messages included, so that no command
/// or trivia answer is ever taken from them.
pub struct IgnoreBots;

#[serenity::async_trait]
impl Plugin for IgnoreBots {
    fn name(&self) -> &'static str {
        "ignore_bots"
    }

    async fn usage(&self, _ctx: &Context) -> Option<String> {
        None
    }

    async fn handle(&self, _ctx: &Context, event: &Event) -> Result<EventHandled> {
        match event {
            Event::Message(msg) if msg.author.bot || msg.webhook_id.is_some() => {
                Ok(EventHandled::Yes)
            }
            _ => Ok(EventHandled::No),
        }
    }
}
