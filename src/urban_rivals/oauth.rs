//! OAuth 1.0a request signing (RFC 5849, HMAC-SHA1)

use anyhow::{anyhow, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use rand::{distributions::Alphanumeric, Rng};
use sha1::Sha1;
use std::borrow::Cow;
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha1 = Hmac<Sha1>;

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const VERSION: &str = "1.0";
const NONCE_LEN: usize = 32;

/// A key/secret pair: consumer credentials, request token or access token.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Token {
    pub token: String,
    pub secret: String,
}

impl Token {
    pub fn new(token: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            secret: secret.into(),
        }
    }
}

/// RFC 3986 percent-encoding; only `A-Za-z0-9-._~` are left as is.
pub fn encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

fn decode(s: &str) -> String {
    urlencoding::decode(s)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| s.to_owned())
}

/// Parse an `application/x-www-form-urlencoded` string into key/value pairs.
pub fn parse_form(s: &str) -> Vec<(String, String)> {
    s.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode(key), decode(value))
        })
        .collect()
}

/// A request to be signed.
pub struct OAuthRequest<'a> {
    method: &'a str,
    url: &'a str,
    consumer: &'a Token,
    token: Option<&'a Token>,
    /// Protocol parameters beyond the standard set, e.g. `oauth_verifier`.
    extra: Vec<(&'a str, &'a str)>,
    /// Form body parameters.  These are covered by the signature.
    form: Vec<(&'a str, &'a str)>,
}

impl<'a> OAuthRequest<'a> {
    pub fn new(method: &'a str, url: &'a str, consumer: &'a Token) -> Self {
        Self {
            method,
            url,
            consumer,
            token: None,
            extra: Vec::new(),
            form: Vec::new(),
        }
    }

    pub fn token(mut self, token: &'a Token) -> Self {
        self.token = Some(token);
        self
    }

    pub fn extra(mut self, key: &'a str, value: &'a str) -> Self {
        self.extra.push((key, value));
        self
    }

    pub fn form(mut self, key: &'a str, value: &'a str) -> Self {
        self.form.push((key, value));
        self
    }

    /// `Authorization` header value with a fresh nonce and timestamp.
    pub fn authorization(&self) -> Result<String> {
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(NONCE_LEN)
            .map(char::from)
            .collect();
        let timestamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

        self.authorization_with(&nonce, timestamp)
    }

    pub fn authorization_with(&self, nonce: &str, timestamp: u64) -> Result<String> {
        let mut oauth = self.protocol_params(nonce, timestamp);
        let signature = self.signature(&oauth)?;
        oauth.push(("oauth_signature".to_owned(), signature));
        oauth.sort();

        let fields = oauth
            .iter()
            .map(|(key, value)| format!("{}=\"{}\"", encode(key), encode(value)))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("OAuth {}", fields))
    }

    fn protocol_params(&self, nonce: &str, timestamp: u64) -> Vec<(String, String)> {
        let mut params = vec![
            ("oauth_consumer_key".to_owned(), self.consumer.token.clone()),
            ("oauth_nonce".to_owned(), nonce.to_owned()),
            ("oauth_signature_method".to_owned(), SIGNATURE_METHOD.to_owned()),
            ("oauth_timestamp".to_owned(), timestamp.to_string()),
            ("oauth_version".to_owned(), VERSION.to_owned()),
        ];
        if let Some(token) = self.token {
            params.push(("oauth_token".to_owned(), token.token.clone()));
        }
        for (key, value) in &self.extra {
            params.push(((*key).to_owned(), (*value).to_owned()));
        }
        params
    }

    /// `METHOD&url&params`, each part percent-encoded.
    fn base_string(&self, oauth: &[(String, String)]) -> String {
        let (base_url, query) = self.url.split_once('?').unwrap_or((self.url, ""));

        let mut params: Vec<(String, String)> = oauth
            .iter()
            .cloned()
            .chain(parse_form(query))
            .chain(
                self.form
                    .iter()
                    .map(|(key, value)| ((*key).to_owned(), (*value).to_owned())),
            )
            .map(|(key, value)| (encode(&key), encode(&value)))
            .collect();
        params.sort();

        let normalized = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("&");

        format!(
            "{}&{}&{}",
            self.method.to_ascii_uppercase(),
            encode(base_url),
            encode(&normalized)
        )
    }

    fn signature(&self, oauth: &[(String, String)]) -> Result<String> {
        let token_secret = self.token.map(|t| t.secret.as_str()).unwrap_or("");
        let key = format!("{}&{}", encode(&self.consumer.secret), encode(token_secret));

        let mut mac = HmacSha1::new_from_slice(key.as_bytes())
            .map_err(|e| anyhow!("Could not create OAuth signing key: {}", e))?;
        mac.update(self.base_string(oauth).as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}
