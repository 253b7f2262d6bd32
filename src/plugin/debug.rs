use crate::{
    context::Context,
    event::{Event, EventHandled},
    log_event,
    logging::*,
    plugin::Plugin,
};
use anyhow::Result;

/// Prints debug information about event to stdout
pub struct Debug;

#[serenity::async_trait]
impl Plugin for Debug {
    fn name(&self) -> &'static str {
        "debug"
    }

    async fn usage(&self, _ctx: &Context) -> Option<String> {
        None
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        match event {
            Event::Ready(ready) => {
                log_event!(
                    "Connected to {} server(s) as {}",
                    ready.guilds.len(),
                    ready.user.color(),
                );
            }
            Event::Message(msg) => {
                log_event!(
                    "{}{}{}{}{}{} {}",
                    msg.guild_id.color(ctx.http).await,
                    Glue.color(),
                    msg.channel_id.color(ctx.http).await,
                    Glue.color(),
                    msg.author.color(),
                    Glue.color(),
                    msg.content,
                );
            }
        }

        Ok(EventHandled::No)
    }
}
