//! Miscellaneous convenience methods

use crate::{context::Context, trivia::ChannelKind};
use anyhow::Result;
use serenity::all::{Channel, ChannelType, GuildId};

#[serenity::async_trait]
pub trait UserIdHelper {
    async fn nick_in_guild(&self, ctx: &Context, guild_id: Option<GuildId>) -> String;
}

#[serenity::async_trait]
impl UserIdHelper for serenity::all::UserId {
    async fn nick_in_guild(&self, ctx: &Context, guild_id: Option<GuildId>) -> String {
        let user = match self.to_user(ctx.cache_http).await {
            Ok(user) => user,
            Err(_) => return format!("<unknown-user-{}>", *self),
        };

        user.nick_in_guild(ctx, guild_id).await
    }
}

#[serenity::async_trait]
pub trait UserHelper {
    async fn nick_in_guild(&self, ctx: &Context, guild_id: Option<GuildId>) -> String;
}

#[serenity::async_trait]
impl UserHelper for serenity::all::User {
    async fn nick_in_guild(&self, ctx: &Context, guild_id: Option<GuildId>) -> String {
        let nick_in_guild = match guild_id {
            Some(guild_id) => self.nick_in(ctx.cache_http, guild_id).await,
            None => None,
        };

        // May not be in a guild, e.g. DM.  Fall back to global username.
        nick_in_guild.unwrap_or_else(|| self.name.clone())
    }
}

#[serenity::async_trait]
pub trait MessageHelper {
    async fn is_from_owner(&self, ctx: &Context) -> bool;
    async fn channel_kind(&self, ctx: &Context) -> Result<ChannelKind>;
    async fn can_manage_messages(&self, ctx: &Context) -> Result<bool>;
}

#[serenity::async_trait]
impl MessageHelper for serenity::all::Message {
    async fn is_from_owner(&self, ctx: &Context) -> bool {
        self.author.id == ctx.cfg.read().await.general.owner_id
    }

    async fn channel_kind(&self, ctx: &Context) -> Result<ChannelKind> {
        let kind = match self.channel(ctx.cache_http).await? {
            Channel::Private(_) => ChannelKind::DirectMessage,
            Channel::Guild(channel) if channel.kind == ChannelType::Text => ChannelKind::Text,
            _ => ChannelKind::Other,
        };
        Ok(kind)
    }

    /// Whether the author holds the Manage Messages permission in the message's channel.  Always
    /// true in direct messages.
    async fn can_manage_messages(&self, ctx: &Context) -> Result<bool> {
        let Some(guild_id) = self.guild_id else {
            return Ok(true);
        };

        let member = self.member(ctx.cache_http).await?;

        // Cache references must not be held across an await
        let Some(guild) = ctx.cache.guild(guild_id) else {
            return Ok(false);
        };
        let Some(channel) = guild.channels.get(&self.channel_id) else {
            return Ok(false);
        };

        Ok(guild
            .user_permissions_in(channel, &member)
            .manage_messages())
    }
}

/// Split `text` into chunks of at most `size` characters.
pub fn split_message(text: &str, size: usize) -> Vec<String> {
    let chars = text.chars().collect::<Vec<_>>();
    chars
        .chunks(size.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_message_respects_char_boundaries() {
        assert!(split_message("", 3).is_empty());
        assert_eq!(split_message("abcdefg", 3), vec!["abc", "def", "g"]);
        assert_eq!(split_message("éèàù", 2), vec!["éè", "àù"]);
    }
}
