//! The Serenity crate we're using for the Discord API is designed around callbacks to handle
//! events.  However, this does not mesh well with our plugin framework here.  To resolve this,
//! the handler translates the callbacks into a distinct Event enum.

use crate::{context::Context, log_error};
use serenity::all::{Message, Ready};

/// A Discord event
pub enum Event {
    Ready(Ready),
    Message(Message),
}

impl Event {
    // When an event occurs, iterate over all the plugins to see if any can/should handle it.
    pub async fn handle(self, ctx: Context<'_>) {
        for plugin in crate::plugin::plugins() {
            match plugin.handle(&ctx, &self).await {
                Ok(EventHandled::Yes) => return,
                Ok(EventHandled::No) => continue,
                Err(err) => log_error!("Error in plugin {}: {:#}", plugin.name(), err),
            }
        }
    }

    /// Split a prefixed bot command, e.g. `//trivia 5 10 10 80`, into the message, the command
    /// name and its arguments.
    pub async fn bot_cmd(&self, ctx: &Context<'_>) -> Option<(&Message, &str, Vec<&str>)> {
        let Event::Message(msg) = self else {
            return None;
        };

        let prefix = ctx.cfg.read().await.general.command_prefix.clone();
        let mut words = msg.content.split_whitespace();
        let cmd = words.next()?.strip_prefix(prefix.as_str())?;
        if cmd.is_empty() {
            return None;
        }

        Some((msg, cmd, words.collect()))
    }

    /// Check if a message is the bot command `cmd`.  Returns the message and the command
    /// arguments.
    pub async fn is_bot_cmd(&self, ctx: &Context<'_>, cmd: &str) -> Option<(&Message, Vec<&str>)> {
        match self.bot_cmd(ctx).await {
            Some((msg, name, args)) if name == cmd => Some((msg, args)),
            _ => None,
        }
    }
}

pub enum EventHandled {
    Yes,
    No,
}
