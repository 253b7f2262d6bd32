use anyhow::{anyhow, Result};
use serenity::all::UserId;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

const CONFIG_PATH_REL_HOME: &str = ".config/zdrone/config.toml";

/// Bot configuration
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Config {
    pub general: General,
    pub urban_rivals: UrbanRivals,
    #[serde(default)]
    pub trivia: Trivia,
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct General {
    pub discord_token: String,
    /// Receives the API authorization link and may run owner-only commands.
    pub owner_id: UserId,
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
}

#[derive(Clone, serde::Serialize, serde::Deserialize)]
pub struct UrbanRivals {
    pub consumer_key: String,
    pub consumer_secret: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_request_token_url")]
    pub request_token_url: String,
    #[serde(default = "default_access_token_url")]
    pub access_token_url: String,
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,
    #[serde(default = "default_callback_url")]
    pub callback_url: String,
    /// Character page paths returned by the API are relative to this.
    #[serde(default = "default_site_url")]
    pub site_url: String,
    /// Where the access token is persisted.  Defaults to a file next to this
    /// configuration.
    pub token_path: Option<PathBuf>,
}

#[derive(Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Trivia {
    pub default_rounds: usize,
    pub max_rounds: usize,
    pub default_illustration_rate: f64,
    pub default_biography_rate: f64,
    pub default_ability_rate: f64,
    pub next_round_delay_seconds: u64,
}

impl Default for Trivia {
    fn default() -> Self {
        Self {
            default_rounds: 10,
            max_rounds: 50,
            default_illustration_rate: 33.0,
            default_biography_rate: 33.0,
            default_ability_rate: 33.0,
            next_round_delay_seconds: 5,
        }
    }
}

fn default_command_prefix() -> String {
    "//".to_owned()
}

fn default_api_url() -> String {
    "https://www.urban-rivals.com/api/".to_owned()
}

fn default_request_token_url() -> String {
    "https://www.urban-rivals.com/api/auth/request_token.php".to_owned()
}

fn default_access_token_url() -> String {
    "http://www.urban-rivals.com/api/auth/access_token.php".to_owned()
}

fn default_authorize_url() -> String {
    "https://www.urban-rivals.com/api/auth/authorize.php".to_owned()
}

fn default_callback_url() -> String {
    "http://localhost/".to_owned()
}

fn default_site_url() -> String {
    "https://www.urban-rivals.com".to_owned()
}

impl Config {
    fn config_path() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|p| p.join(CONFIG_PATH_REL_HOME))
            .ok_or(anyhow!("Could not find home directory"))
    }

    pub async fn load() -> Result<Self> {
        let path = Self::config_path()?;

        let mut file = tokio::fs::File::open(&path).await.map_err(|e| {
            anyhow!(
                "Could not open configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        let mut contents = String::new();
        file.read_to_string(&mut contents).await.map_err(|e| {
            anyhow!(
                "Could not read configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        Self::parse(&contents).map_err(|e| {
            anyhow!(
                "Could not parse configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub async fn reload(&mut self) -> Result<()> {
        let new = Self::load().await?;
        *self = new;
        Ok(())
    }
}

impl UrbanRivals {
    pub fn token_path(&self) -> Result<PathBuf> {
        match &self.token_path {
            Some(path) => Ok(path.clone()),
            None => Config::config_path()?
                .parent()
                .map(|dir| dir.join("tokens.json"))
                .ok_or(anyhow!("Configuration path has no parent directory")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_configuration_parses() {
        let cfg = Config::parse(include_str!("../config.example.toml")).unwrap();

        assert_eq!(cfg.general.command_prefix, "//");
        assert_eq!(cfg.general.owner_id, UserId::new(123456789012345678));
        assert_eq!(cfg.urban_rivals.api_url, "https://www.urban-rivals.com/api/");
        assert_eq!(cfg.trivia.default_rounds, 10);
        assert_eq!(cfg.trivia.max_rounds, 50);
        assert_eq!(cfg.trivia.next_round_delay_seconds, 5);
    }

    #[test]
    fn optional_sections_use_defaults() {
        let cfg = Config::parse(
            r#"
            [general]
            discord_token = "abc"
            owner_id = 42

            [urban_rivals]
            consumer_key = "key"
            consumer_secret = "secret"
            token_path = "/tmp/zdrone-tokens.json"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.general.command_prefix, "//");
        assert_eq!(cfg.urban_rivals.callback_url, "http://localhost/");
        assert_eq!(cfg.urban_rivals.site_url, "https://www.urban-rivals.com");
        assert_eq!(
            cfg.urban_rivals.token_path().unwrap(),
            PathBuf::from("/tmp/zdrone-tokens.json")
        );
        assert_eq!(cfg.trivia.default_illustration_rate, 33.0);
        assert_eq!(cfg.trivia.max_rounds, 50);
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let result = Config::parse(
            r#"
            [general]
            discord_token = "abc"
            owner_id = 42
            "#,
        );
        assert!(result.is_err());
    }
}
