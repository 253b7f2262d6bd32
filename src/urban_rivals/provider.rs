use crate::urban_rivals::oauth::Token;
use anyhow::{anyhow, Result};
use serde_json::{json, Value};

/// One call of a batched API request.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Query<'a> {
    pub call: &'a str,
    pub params: Value,
}

/// The account the bot is authenticated as.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct Player {
    pub name: String,
}

/// Authenticated access to the game API.
#[serenity::async_trait]
pub trait TokenProvider: Send + Sync {
    /// Obtain a fresh request token to be authorized by a user.
    async fn request_token(&self) -> Result<Token>;

    /// Page where a user authorizes `request_token`.
    fn authorize_url(&self, request_token: &Token, callback: Option<&str>) -> String;

    /// Exchange an authorized request token for an access token.  The access
    /// token is kept for subsequent queries.
    async fn access_token(&self, request_token: &Token, verifier: &str) -> Result<Token>;

    async fn set_access_token(&self, token: Token);

    async fn current_access_token(&self) -> Option<Token>;

    /// Run several calls in one request.  The result is keyed by call name.
    async fn multiple_queries(&self, queries: &[Query<'_>]) -> Result<Value>;

    async fn query(&self, call: &str, params: Value) -> Result<Value> {
        let mut results = self.multiple_queries(&[Query { call, params }]).await?;
        results
            .get_mut(call)
            .map(Value::take)
            .ok_or_else(|| anyhow!("API response has no result for `{}`", call))
    }

    async fn logged_player(&self) -> Result<Player> {
        let mut result = self.query("general.getPlayer", json!({})).await?;
        let player = result
            .pointer_mut("/context/player")
            .map(Value::take)
            .ok_or_else(|| anyhow!("API response has no player"))?;

        serde_json::from_value(player).map_err(|e| anyhow!("Could not parse player: {}", e))
    }
}
