use crate::{log_internal, urban_rivals::Token};
use anyhow::{anyhow, Result};
use std::path::PathBuf;

/// The API access token, persisted across sessions as JSON
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The stored token, if any.  An unreadable or malformed file counts as no
    /// token: the bot will simply ask for a new authorization.
    pub async fn load(&self) -> Option<Token> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                log_internal!(
                    "Could not read token store `{}`: {}",
                    self.path.to_string_lossy(),
                    e
                );
                return None;
            }
        };

        if contents.trim().is_empty() {
            return None;
        }

        match serde_json::from_str(&contents) {
            Ok(token) => Some(token),
            Err(e) => {
                log_internal!(
                    "Could not parse token store `{}`: {}",
                    self.path.to_string_lossy(),
                    e
                );
                None
            }
        }
    }

    pub async fn save(&self, token: &Token) -> Result<()> {
        let path = &self.path;
        let token_str = serde_json::to_string(token)
            .map_err(|e| anyhow!("Could not serialize token: {}", e))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                anyhow!(
                    "Could not create directory `{}`: {}",
                    parent.to_string_lossy(),
                    e
                )
            })?;
        }

        // Create a temporary file in the same directory.
        let tmp_path = path.with_extension("json.new");

        tokio::fs::write(&tmp_path, token_str).await.map_err(|e| {
            anyhow!(
                "Could not write token to temporary file `{}`: {}",
                tmp_path.to_string_lossy(),
                e
            )
        })?;

        // Atomically rename the temporary file over the target file.
        tokio::fs::rename(&tmp_path, path).await.map_err(|e| {
            anyhow!(
                "Could not rename temporary file `{}` to `{}`: {}",
                tmp_path.to_string_lossy(),
                path.to_string_lossy(),
                e
            )
        })?;

        Ok(())
    }
}
