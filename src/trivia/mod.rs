//! Multiple-choice trivia about game characters.

pub mod character;
pub mod question;
pub mod scoreboard;
pub mod session;
pub mod store;

pub use character::{Character, CharacterLevel, CharacterSource};
pub use question::{Question, Weights};
pub use session::{AnswerOutcome, ChannelKind, RoundAdvance, TriviaSession, TriviaSettings};
pub use store::SessionStore;
