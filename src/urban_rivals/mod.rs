//! Access to the Urban Rivals game API.

pub mod characters;
pub mod client;
pub mod oauth;
pub mod provider;

pub use characters::ApiCharacterSource;
pub use client::UrbanRivalsClient;
pub use oauth::Token;
pub use provider::{Player, TokenProvider};
