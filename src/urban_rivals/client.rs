use crate::{
    config,
    log_internal,
    urban_rivals::{
        oauth::{encode, parse_form, OAuthRequest, Token},
        provider::{Query, TokenProvider},
    },
};
use anyhow::{anyhow, Result};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use tokio::sync::RwLock;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// OAuth 1.0a client of the Urban Rivals API
pub struct UrbanRivalsClient {
    http: reqwest::Client,
    consumer: Token,
    api_url: String,
    request_token_url: String,
    access_token_url: String,
    authorize_url: String,
    access: RwLock<Option<Token>>,
}

impl UrbanRivalsClient {
    pub fn new(cfg: &config::UrbanRivals) -> Self {
        Self {
            http: reqwest::Client::new(),
            consumer: Token::new(&cfg.consumer_key, &cfg.consumer_secret),
            api_url: cfg.api_url.clone(),
            request_token_url: cfg.request_token_url.clone(),
            access_token_url: cfg.access_token_url.clone(),
            authorize_url: cfg.authorize_url.clone(),
            access: RwLock::new(None),
        }
    }

    /// POST to a token endpoint and read the token from the form-encoded reply.
    async fn fetch_token(&self, url: &str, authorization: String) -> Result<Token> {
        let body = self
            .http
            .post(url)
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body("")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        token_from_response(&body)
    }
}

fn token_from_response(body: &str) -> Result<Token> {
    let fields = parse_form(body);
    let field = |name: &str| {
        fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| anyhow!("Token response has no `{}`: {}", name, body))
    };

    Ok(Token {
        token: field("oauth_token")?,
        secret: field("oauth_token_secret")?,
    })
}

#[serenity::async_trait]
impl TokenProvider for UrbanRivalsClient {
    async fn request_token(&self) -> Result<Token> {
        let authorization =
            OAuthRequest::new("POST", &self.request_token_url, &self.consumer).authorization()?;

        log_internal!("Requesting OAuth request token... ");
        let token = self
            .fetch_token(&self.request_token_url, authorization)
            .await?;
        log_internal!("Requesting OAuth request token... done");
        Ok(token)
    }

    fn authorize_url(&self, request_token: &Token, callback: Option<&str>) -> String {
        let mut url = format!(
            "{}?oauth_token={}",
            self.authorize_url,
            encode(&request_token.token)
        );
        if let Some(callback) = callback.filter(|c| !c.is_empty()) {
            url.push_str("&oauth_callback=");
            url.push_str(&encode(callback));
        }
        url
    }

    async fn access_token(&self, request_token: &Token, verifier: &str) -> Result<Token> {
        let authorization = OAuthRequest::new("POST", &self.access_token_url, &self.consumer)
            .token(request_token)
            .extra("oauth_verifier", verifier)
            .authorization()?;

        log_internal!("Exchanging OAuth verifier for an access token... ");
        let token = self
            .fetch_token(&self.access_token_url, authorization)
            .await?;
        log_internal!("Exchanging OAuth verifier for an access token... done");

        *self.access.write().await = Some(token.clone());
        Ok(token)
    }

    async fn set_access_token(&self, token: Token) {
        *self.access.write().await = Some(token);
    }

    async fn current_access_token(&self) -> Option<Token> {
        self.access.read().await.clone()
    }

    async fn multiple_queries(&self, queries: &[Query<'_>]) -> Result<Value> {
        let access = self
            .current_access_token()
            .await
            .ok_or(anyhow!("Not authenticated against the Urban Rivals API"))?;
        let request = serde_json::to_string(queries)?;
        let authorization = OAuthRequest::new("POST", &self.api_url, &self.consumer)
            .token(&access)
            .form("request", &request)
            .authorization()?;

        let calls = queries
            .iter()
            .map(|q| q.call)
            .collect::<Vec<_>>()
            .join(", ");
        log_internal!("Querying API ({})... ", calls);
        let response = self
            .http
            .post(&self.api_url)
            .header(AUTHORIZATION, authorization)
            .form(&[("request", request.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        log_internal!("Querying API ({})... done", calls);

        Ok(response)
    }
}
