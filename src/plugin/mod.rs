use crate::{
    context::Context,
    event::{Event, EventHandled},
};
use anyhow::Result;

mod api;
mod auth;
mod debug;
mod help;
mod ignore_bots;
mod reload;
mod trivia;

#[serenity::async_trait]
pub trait Plugin: Sync + Send {
    /// Plugin name.  Used for debug and as the command name of single-command plugins
    fn name(&self) -> &'static str;
    /// Help message lines.  None if no help message
    async fn usage(&self, ctx: &Context) -> Option<String>;
    /// Potentially handle event.  Returns:
    /// - Ok(EventHandled::Yes) if the event has been handled and no other plugin should attempt to
    /// handle it
    /// - Ok(EventHandled::No) if another plugin should attempt to handle the event
    /// - Err if an error occurred
    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled>;
}

/// Ordered list of available plugins
pub fn plugins() -> Vec<Box<dyn Plugin>> {
    vec![
        // Core bot operations
        Box::new(debug::Debug),
        Box::new(ignore_bots::IgnoreBots),
        Box::new(auth::Auth),
        Box::new(help::Help),
        Box::new(reload::Reload),
        // Urban Rivals
        Box::new(api::Api),
        Box::new(trivia::Trivia),
    ]
}
