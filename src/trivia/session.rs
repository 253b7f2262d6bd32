//! A trivia game in one channel.
//!
//! A session moves through `Created -> Running -> Finished`, and may be
//! `Stopped` at any point before it finishes.  While running, each round is
//! either accepting answers or idle, waiting for the next question.

use crate::trivia::{
    character::{Character, CharacterSource},
    question::{GenerateError, Question, QuestionGenerator, Response, Weights},
    scoreboard::ScoreBoard,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serenity::all::UserId;
use std::sync::Arc;

/// Kind of chat channel a session is played in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelKind {
    Text,
    DirectMessage,
    Group,
    Other,
}

impl ChannelKind {
    pub fn is_supported(self) -> bool {
        !matches!(self, ChannelKind::Other)
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("You cannot create a trivia with 0 round.")]
    NoRounds,
    #[error("The channel is not valid.")]
    UnsupportedChannel,
    #[error("Question rates must be non-negative numbers.")]
    InvalidWeights,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriviaSettings {
    pub rounds: usize,
    pub weights: Weights,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Created,
    Running,
    Finished,
    Stopped,
}

/// Result of moving to the next round.
#[derive(Debug, PartialEq)]
pub enum RoundAdvance {
    /// A new round started with this question.
    Question(Question),
    /// The last round was already played; the game is now over.
    Finished(GameSummary),
    /// The session is not running.
    Inactive,
}

/// Result of a player's answer.
#[derive(Debug, PartialEq)]
pub enum AnswerOutcome {
    /// No round has been played yet.
    NotStarted,
    /// The current round was already won, or the game is no longer running.
    RoundOver,
    Wrong,
    Correct {
        expected: String,
        character: Character,
        score: u32,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameSummary {
    pub winner: Option<(UserId, u32)>,
}

impl GameSummary {
    pub fn message(&self, winner_name: &str) -> String {
        let mut message = String::from("The trivia is over.");
        match self.winner {
            Some((_, score)) => message.push_str(&format!(
                "\n**{}** won the trivia with **{}** points. Congratulations.",
                winner_name, score
            )),
            None => message.push_str("\nNo player has scored any points during this trivia."),
        }
        message
    }
}

pub struct TriviaSession {
    settings: TriviaSettings,
    generator: QuestionGenerator,
    questions: Vec<Question>,
    responses: Vec<Response>,
    /// `None` until the first round starts.
    round: Option<usize>,
    round_playing: bool,
    phase: Phase,
    scoreboard: ScoreBoard,
}

impl TriviaSession {
    pub fn new(
        settings: TriviaSettings,
        channel: ChannelKind,
        source: Arc<dyn CharacterSource>,
    ) -> Result<Self, SessionError> {
        if !channel.is_supported() {
            return Err(SessionError::UnsupportedChannel);
        }
        if settings.rounds == 0 {
            return Err(SessionError::NoRounds);
        }
        if !settings.weights.is_valid() {
            return Err(SessionError::InvalidWeights);
        }

        Ok(Self {
            settings,
            generator: QuestionGenerator::new(source),
            questions: Vec::new(),
            responses: Vec::new(),
            round: None,
            round_playing: false,
            phase: Phase::Created,
            scoreboard: ScoreBoard::new(),
        })
    }

    /// Generate every round's question up front.
    pub async fn start(&mut self) -> Result<(), GenerateError> {
        let mut rng = StdRng::from_entropy();
        self.start_with_rng(&mut rng).await
    }

    pub async fn start_with_rng<R: Rng + Send>(
        &mut self,
        rng: &mut R,
    ) -> Result<(), GenerateError> {
        if self.phase != Phase::Created {
            return Ok(());
        }

        let pairs = self
            .generator
            .generate_many(self.settings.rounds, &self.settings.weights, rng)
            .await?;
        let (questions, responses): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        self.questions = questions;
        self.responses = responses;
        self.phase = Phase::Running;
        Ok(())
    }

    pub fn advance_round(&mut self) -> RoundAdvance {
        if self.phase != Phase::Running {
            return RoundAdvance::Inactive;
        }

        if self.is_last_round() {
            self.round_playing = false;
            self.phase = Phase::Finished;
            return RoundAdvance::Finished(self.summary());
        }

        let next = self.round.map_or(0, |round| round + 1);
        self.round = Some(next);
        self.round_playing = true;
        RoundAdvance::Question(self.questions[next].clone())
    }

    pub fn submit_answer(&mut self, player: UserId, answer: &str) -> AnswerOutcome {
        let Some(round) = self.round else {
            return AnswerOutcome::NotStarted;
        };
        if !self.round_playing {
            return AnswerOutcome::RoundOver;
        }

        let response = &self.responses[round];
        if answer.to_lowercase() != response.expected.to_lowercase() {
            return AnswerOutcome::Wrong;
        }

        self.round_playing = false;
        let score = self.scoreboard.increment(player);
        AnswerOutcome::Correct {
            expected: response.expected.clone(),
            character: response.character.clone(),
            score,
        }
    }

    pub fn stop(&mut self) {
        if self.phase != Phase::Finished {
            self.phase = Phase::Stopped;
        }
        self.round_playing = false;
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            winner: self.scoreboard.ranked().into_iter().next(),
        }
    }

    pub fn is_last_round(&self) -> bool {
        self.round.map_or(0, |round| round + 1) >= self.settings.rounds
    }

    /// 1-based round number, 0 before the first round.
    pub fn display_round(&self) -> usize {
        self.round.map_or(0, |round| round + 1)
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Created | Phase::Running)
    }

    pub fn scoreboard(&self) -> &ScoreBoard {
        &self.scoreboard
    }
}

#[cfg(test)]
impl TriviaSession {
    pub fn current_question(&self) -> Option<&Question> {
        self.round.and_then(|round| self.questions.get(round))
    }

    pub fn is_round_playing(&self) -> bool {
        self.round_playing
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> Option<usize> {
        self.round
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn responses(&self) -> &[Response] {
        &self.responses
    }
}
