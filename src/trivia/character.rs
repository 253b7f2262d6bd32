//! Character records used as trivia material, and the capability to fetch them.

use anyhow::Result;
use serde::{Deserialize, Deserializer};
use std::{fmt::Display, str::FromStr};

/// A playable character as returned by the game API.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Character {
    #[serde(deserialize_with = "number_or_string")]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub rarity: String,
    #[serde(default)]
    pub ability: String,
    #[serde(default)]
    pub description: String,
    #[serde(deserialize_with = "number_or_string")]
    pub level_min: u32,
    #[serde(deserialize_with = "number_or_string")]
    pub level_max: u32,
    /// Path of the character page, relative to the game site.
    #[serde(default)]
    pub url: String,
}

/// A character at a given level.  Names and pictures change with the level.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CharacterLevel {
    pub name: String,
    #[serde(default, deserialize_with = "number_or_string")]
    pub level: u32,
    #[serde(rename = "characterHDBigPictURL")]
    pub picture_url: String,
}

/// Where trivia material comes from.
#[serenity::async_trait]
pub trait CharacterSource: Send + Sync {
    /// Every playable character, in a stable order.
    async fn characters(&self) -> Result<Vec<Character>>;

    /// The character as it appears at `level`.
    async fn character_level(&self, character: &Character, level: u32) -> Result<CharacterLevel>;
}

/// The API is loose about numbers and sometimes sends them as strings.
fn number_or_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
    T::Err: Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr<T> {
        Number(T),
        Text(String),
    }

    match Repr::<T>::deserialize(deserializer)? {
        Repr::Number(n) => Ok(n),
        Repr::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
