use crate::{
    trivia::{Character, CharacterLevel, CharacterSource},
    urban_rivals::provider::TokenProvider,
};
use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;

/// Trivia material read from the game API.
pub struct ApiCharacterSource {
    api: Arc<dyn TokenProvider>,
}

impl ApiCharacterSource {
    pub fn new(api: Arc<dyn TokenProvider>) -> Self {
        Self { api }
    }
}

/// API list results wrap their entries in an `items` array.
fn items<T: DeserializeOwned>(mut result: Value) -> Result<Vec<T>> {
    let items = result
        .get_mut("items")
        .map(Value::take)
        .ok_or_else(|| anyhow!("API result has no `items`"))?;

    serde_json::from_value(items).map_err(|e| anyhow!("Could not parse API items: {}", e))
}

#[serenity::async_trait]
impl CharacterSource for ApiCharacterSource {
    async fn characters(&self) -> Result<Vec<Character>> {
        let result = self
            .api
            .query(
                "characters.getCharacters",
                json!({ "sortby": "clan", "maxLevels": true }),
            )
            .await?;
        items(result)
    }

    async fn character_level(&self, character: &Character, level: u32) -> Result<CharacterLevel> {
        let result = self
            .api
            .query(
                "characters.getCharacterLevels",
                json!({
                    "characterID": character.id,
                    "levelMax": level,
                    "imageSize": "large",
                }),
            )
            .await?;

        // Levels come lowest first, up to `levelMax`
        items::<CharacterLevel>(result)?
            .pop()
            .ok_or_else(|| anyhow!("No level {} for character `{}`", level, character.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::urban_rivals::{oauth::Token, provider::Query};
    use std::sync::Mutex;

    /// Answers every call with a canned result and records the calls made.
    struct CannedApi {
        result: Value,
        calls: Mutex<Vec<(String, Value)>>,
    }

    #[serenity::async_trait]
    impl TokenProvider for CannedApi {
        async fn request_token(&self) -> Result<Token> {
            Err(anyhow!("not supported"))
        }

        fn authorize_url(&self, _: &Token, _: Option<&str>) -> String {
            String::new()
        }

        async fn access_token(&self, _: &Token, _: &str) -> Result<Token> {
            Err(anyhow!("not supported"))
        }

        async fn set_access_token(&self, _: Token) {}

        async fn current_access_token(&self) -> Option<Token> {
            None
        }

        async fn multiple_queries(&self, queries: &[Query<'_>]) -> Result<Value> {
            let mut response = serde_json::Map::new();
            let mut calls = self.calls.lock().unwrap();
            for query in queries {
                calls.push((query.call.to_owned(), query.params.clone()));
                response.insert(query.call.to_owned(), self.result.clone());
            }
            Ok(Value::Object(response))
        }
    }

    fn canned(result: Value) -> (Arc<CannedApi>, ApiCharacterSource) {
        let api = Arc::new(CannedApi {
            result,
            calls: Mutex::new(Vec::new()),
        });
        (api.clone(), ApiCharacterSource::new(api))
    }

    #[tokio::test]
    async fn characters_are_read_from_items() {
        let (api, source) = canned(json!({
            "items": [
                {
                    "id": 1, "name": "Megan Cr", "rarity": "cr", "ability": "Power +2",
                    "description": "Megan sings.", "level_min": 2, "level_max": 5,
                    "url": "/game/characters/?id_perso=1"
                },
                {
                    "id": "2", "name": "Ambre", "rarity": "r", "ability": "Attack +8",
                    "description": "", "level_min": "1", "level_max": "3"
                }
            ]
        }));

        let characters = source.characters().await.unwrap();
        assert_eq!(characters.len(), 2);
        assert_eq!(characters[0].name, "Megan Cr");
        assert_eq!(characters[1].id, 2);
        assert_eq!(characters[1].level_max, 3);
        assert_eq!(characters[1].url, "");

        let calls = api.calls.lock().unwrap();
        assert_eq!(calls[0].0, "characters.getCharacters");
        assert_eq!(calls[0].1, json!({ "sortby": "clan", "maxLevels": true }));
    }

    #[tokio::test]
    async fn level_lookup_takes_the_highest_level() {
        let (api, source) = canned(json!({
            "items": [
                { "name": "Megan", "level": 2, "characterHDBigPictURL": "https://pics/2.png" },
                { "name": "Megan Cr", "level": 3, "characterHDBigPictURL": "https://pics/3.png" }
            ]
        }));
        let megan = Character {
            id: 1,
            name: "Megan Cr".to_owned(),
            rarity: "cr".to_owned(),
            ability: String::new(),
            description: String::new(),
            level_min: 2,
            level_max: 5,
            url: String::new(),
        };

        let level = source.character_level(&megan, 3).await.unwrap();
        assert_eq!(level.name, "Megan Cr");
        assert_eq!(level.picture_url, "https://pics/3.png");

        let calls = api.calls.lock().unwrap();
        assert_eq!(
            calls[0].1,
            json!({ "characterID": 1, "levelMax": 3, "imageSize": "large" })
        );
    }

    #[tokio::test]
    async fn missing_items_is_an_error() {
        let (_, source) = canned(json!({ "error": "bad call" }));
        assert!(source.characters().await.is_err());

        let (_, source) = canned(json!({ "items": [] }));
        let megan = Character {
            id: 1,
            name: "Megan".to_owned(),
            rarity: String::new(),
            ability: String::new(),
            description: String::new(),
            level_min: 1,
            level_max: 1,
            url: String::new(),
        };
        assert!(source.character_level(&megan, 1).await.is_err());
    }
}
