//! Weighted-random trivia question generation.

use crate::trivia::character::{Character, CharacterSource};
use futures_util::future::try_join_all;
use rand::{seq::SliceRandom, Rng};
use regex::Regex;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::OnceCell;

const ILLUSTRATION_PROMPT: &str = "Which character has this illustration ?";
const BIOGRAPHY_PROMPT: &str = "Which character has the following biography ?";
const ABILITY_PROMPT: &str = "Which character has the following ability ?";

/// Replaces the character's name in biographies.
const REDACTED: &str = "???";

/// Rarities whose display names carry a 3-character suffix, e.g. `Megan Cr`.
const SUFFIXED_RARITIES: [&str; 3] = ["cr", "m", "l"];

/// Suffixes that may follow a masked name inside a biography.
const NAME_SUFFIXES: &str = "Cr|Mt|Ld";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuestionKind {
    Illustration,
    Biography,
    Ability,
}

/// Relative probabilities of each question kind.  They need not sum to 100.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Weights {
    pub illustration: f64,
    pub biography: f64,
    pub ability: f64,
}

impl Weights {
    pub fn new(illustration: f64, biography: f64, ability: f64) -> Self {
        Self {
            illustration,
            biography,
            ability,
        }
    }

    pub fn is_valid(&self) -> bool {
        [self.illustration, self.biography, self.ability]
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0)
            && (self.illustration + self.biography + self.ability).is_finite()
    }

    /// Draw a question kind.
    ///
    /// The draw is uniform over `[0, floor(sum))`.  Illustration and biography
    /// keep their exact share of that range, so ability absorbs whatever the
    /// floor takes away.
    pub fn pick_kind<R: Rng>(&self, rng: &mut R) -> QuestionKind {
        let bound = (self.illustration + self.biography + self.ability).floor();
        let choice = if bound > 0.0 {
            rng.gen_range(0.0..bound)
        } else {
            0.0
        };
        self.kind_for(choice)
    }

    pub fn kind_for(&self, choice: f64) -> QuestionKind {
        if choice < self.illustration {
            QuestionKind::Illustration
        } else if choice < self.illustration + self.biography {
            QuestionKind::Biography
        } else {
            QuestionKind::Ability
        }
    }
}

/// A question as shown to players.
#[derive(Clone, Debug, PartialEq)]
pub struct Question {
    pub kind: QuestionKind,
    pub text: String,
    pub picture: Option<String>,
}

/// The expected answer to the question with the same round index.
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    pub expected: String,
    pub character: Character,
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("the character pool is empty")]
    EmptyPool,
    #[error("no character has a unique ability")]
    NoUniqueAbility,
    #[error("could not fetch character data: {0:#}")]
    Source(anyhow::Error),
}

/// Random choices for one question, made before any network lookup.
enum Plan {
    Illustration { character: Character, level: u32 },
    Biography(Character),
    Ability(Character),
}

/// Produces question/answer pairs from a character source.
///
/// The character pool and its unique-ability subset are fetched at most once
/// per generator.
pub struct QuestionGenerator {
    source: Arc<dyn CharacterSource>,
    pool: OnceCell<Vec<Character>>,
    unique_abilities: OnceCell<Vec<Character>>,
}

impl QuestionGenerator {
    pub fn new(source: Arc<dyn CharacterSource>) -> Self {
        Self {
            source,
            pool: OnceCell::new(),
            unique_abilities: OnceCell::new(),
        }
    }

    pub async fn pool(&self) -> Result<&[Character], GenerateError> {
        self.pool
            .get_or_try_init(|| async {
                self.source
                    .characters()
                    .await
                    .map_err(GenerateError::Source)
            })
            .await
            .map(Vec::as_slice)
    }

    /// Characters whose ability text appears exactly once in the pool.
    pub async fn unique_ability_pool(&self) -> Result<&[Character], GenerateError> {
        let pool = self.pool().await?;
        let unique = self
            .unique_abilities
            .get_or_init(|| async { unique_ability_characters(pool) })
            .await;
        Ok(unique.as_slice())
    }

    pub async fn generate<R: Rng + Send>(
        &self,
        weights: &Weights,
        rng: &mut R,
    ) -> Result<(Question, Response), GenerateError> {
        let pool = self.pool().await?;
        let unique = self.unique_ability_pool().await?;
        let plan = plan(pool, unique, weights, rng)?;
        self.resolve(plan).await
    }

    /// Generate `count` pairs.  Lookups run concurrently, but pair `i` is always
    /// the one the `i`-th sequential call to [`Self::generate`] would produce.
    pub async fn generate_many<R: Rng + Send>(
        &self,
        count: usize,
        weights: &Weights,
        rng: &mut R,
    ) -> Result<Vec<(Question, Response)>, GenerateError> {
        let pool = self.pool().await?;
        let unique = self.unique_ability_pool().await?;
        let plans = (0..count)
            .map(|_| plan(pool, unique, weights, rng))
            .collect::<Result<Vec<_>, _>>()?;

        try_join_all(plans.into_iter().map(|plan| self.resolve(plan))).await
    }

    async fn resolve(&self, plan: Plan) -> Result<(Question, Response), GenerateError> {
        match plan {
            Plan::Illustration { character, level } => {
                let at_level = self
                    .source
                    .character_level(&character, level)
                    .await
                    .map_err(GenerateError::Source)?;
                let question = Question {
                    kind: QuestionKind::Illustration,
                    text: ILLUSTRATION_PROMPT.to_owned(),
                    picture: Some(at_level.picture_url),
                };
                let response = Response {
                    expected: at_level.name,
                    character,
                };
                Ok((question, response))
            }
            Plan::Biography(character) => {
                let question = Question {
                    kind: QuestionKind::Biography,
                    text: format!("{}\n> {}", BIOGRAPHY_PROMPT, redacted_biography(&character)),
                    picture: None,
                };
                let response = Response {
                    expected: character.name.clone(),
                    character,
                };
                Ok((question, response))
            }
            Plan::Ability(character) => {
                let question = Question {
                    kind: QuestionKind::Ability,
                    text: format!("{}\n> {}", ABILITY_PROMPT, block_quote(&character.ability)),
                    picture: None,
                };
                let response = Response {
                    expected: character.name.clone(),
                    character,
                };
                Ok((question, response))
            }
        }
    }
}

fn plan<R: Rng>(
    pool: &[Character],
    unique_abilities: &[Character],
    weights: &Weights,
    rng: &mut R,
) -> Result<Plan, GenerateError> {
    match weights.pick_kind(rng) {
        QuestionKind::Illustration => {
            let character = pool.choose(rng).ok_or(GenerateError::EmptyPool)?;
            let level = random_level(character, rng);
            Ok(Plan::Illustration {
                character: character.clone(),
                level,
            })
        }
        QuestionKind::Biography => pool
            .choose(rng)
            .cloned()
            .map(Plan::Biography)
            .ok_or(GenerateError::EmptyPool),
        QuestionKind::Ability => {
            if pool.is_empty() {
                return Err(GenerateError::EmptyPool);
            }
            unique_abilities
                .choose(rng)
                .cloned()
                .map(Plan::Ability)
                .ok_or(GenerateError::NoUniqueAbility)
        }
    }
}

/// Level between `level_min` and `level_max` inclusive, rounded to nearest.
fn random_level<R: Rng>(character: &Character, rng: &mut R) -> u32 {
    let span = character.level_max.saturating_sub(character.level_min);
    let offset = (rng.gen::<f64>() * f64::from(span)).round() as u32;
    character.level_min + offset.min(span)
}

fn unique_ability_characters(pool: &[Character]) -> Vec<Character> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for character in pool {
        *counts.entry(character.ability.as_str()).or_default() += 1;
    }

    pool.iter()
        .filter(|c| counts.get(c.ability.as_str()) == Some(&1))
        .cloned()
        .collect()
}

/// Display name without its rarity suffix.
pub fn masked_name(character: &Character) -> &str {
    let name = character.name.as_str();
    if !SUFFIXED_RARITIES.contains(&character.rarity.as_str()) {
        return name;
    }

    match name.char_indices().rev().nth(2) {
        Some((cut, _)) if cut > 0 => &name[..cut],
        _ => name,
    }
}

fn block_quote(text: &str) -> String {
    text.replace('\n', "\n> ")
}

/// Biography quoted for Discord with every mention of the character hidden.
pub fn redacted_biography(character: &Character) -> String {
    let quoted = block_quote(&character.description);
    let masked = masked_name(character);
    if masked.is_empty() {
        return quoted;
    }

    let pattern = format!("{}( ({}))?", regex::escape(masked), NAME_SUFFIXES);
    match Regex::new(&pattern) {
        Ok(re) => re.replace_all(&quoted, REDACTED).into_owned(),
        Err(_) => quoted.replace(masked, REDACTED),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::trivia::character::CharacterLevel;
    use anyhow::anyhow;
    use rand::{rngs::StdRng, SeedableRng};
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) fn character(id: u64, name: &str, rarity: &str, ability: &str) -> Character {
        Character {
            id,
            name: name.to_owned(),
            rarity: rarity.to_owned(),
            ability: ability.to_owned(),
            description: format!("{} lives in the city.", name),
            level_min: 2,
            level_max: 5,
            url: format!("/game/characters/?id_perso={}", id),
        }
    }

    /// In-memory source counting how often the pool is fetched.
    pub(crate) struct FakeSource {
        pub characters: Vec<Character>,
        pub fetches: AtomicUsize,
    }

    impl FakeSource {
        pub fn new(characters: Vec<Character>) -> Arc<Self> {
            Arc::new(Self {
                characters,
                fetches: AtomicUsize::new(0),
            })
        }
    }

    #[serenity::async_trait]
    impl CharacterSource for FakeSource {
        async fn characters(&self) -> anyhow::Result<Vec<Character>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.characters.clone())
        }

        async fn character_level(
            &self,
            character: &Character,
            level: u32,
        ) -> anyhow::Result<CharacterLevel> {
            Ok(CharacterLevel {
                name: format!("{} L{}", character.name, level),
                level,
                picture_url: format!("https://pics.example/{}/{}.png", character.id, level),
            })
        }
    }

    struct BrokenSource;

    #[serenity::async_trait]
    impl CharacterSource for BrokenSource {
        async fn characters(&self) -> anyhow::Result<Vec<Character>> {
            Err(anyhow!("api unreachable"))
        }

        async fn character_level(&self, _: &Character, _: u32) -> anyhow::Result<CharacterLevel> {
            Err(anyhow!("api unreachable"))
        }
    }

    pub(crate) fn sample_pool() -> Vec<Character> {
        vec![
            character(1, "Megan Cr", "cr", "Power +2"),
            character(2, "Ambre", "r", "Attack +8"),
            character(3, "Eyrton", "u", "Power +2"),
            character(4, "Vansaar Ld", "l", "Stop: Opp. Bonus"),
        ]
    }

    #[test]
    fn kind_boundaries_follow_cumulative_order() {
        let weights = Weights::new(10.0, 20.0, 30.5);
        assert_eq!(weights.kind_for(0.0), QuestionKind::Illustration);
        assert_eq!(weights.kind_for(9.99), QuestionKind::Illustration);
        assert_eq!(weights.kind_for(10.0), QuestionKind::Biography);
        assert_eq!(weights.kind_for(29.99), QuestionKind::Biography);
        assert_eq!(weights.kind_for(30.0), QuestionKind::Ability);
    }

    #[test]
    fn kind_draw_converges_to_weights() {
        let weights = Weights::new(25.0, 25.0, 50.0);
        let mut rng = StdRng::seed_from_u64(7);
        let mut counts = [0usize; 3];
        for _ in 0..20_000 {
            match weights.pick_kind(&mut rng) {
                QuestionKind::Illustration => counts[0] += 1,
                QuestionKind::Biography => counts[1] += 1,
                QuestionKind::Ability => counts[2] += 1,
            }
        }
        assert!((4_500..5_500).contains(&counts[0]), "{:?}", counts);
        assert!((4_500..5_500).contains(&counts[1]), "{:?}", counts);
        assert!((9_500..10_500).contains(&counts[2]), "{:?}", counts);
    }

    #[test]
    fn floored_bound_shrinks_the_last_kind() {
        // floor(50 + 49.6 + 0.9) = 100, so the draw never reaches ability's range.
        let weights = Weights::new(50.0, 49.6, 0.9);
        let mut rng = StdRng::seed_from_u64(3);
        let mut abilities = 0;
        for _ in 0..5_000 {
            if weights.pick_kind(&mut rng) == QuestionKind::Ability {
                abilities += 1;
            }
        }
        assert!(abilities < 100, "{}", abilities);
    }

    #[test]
    fn zero_bound_does_not_panic() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            Weights::new(0.0, 0.0, 0.0).pick_kind(&mut rng),
            QuestionKind::Ability
        );
        assert_eq!(
            Weights::new(0.5, 0.2, 0.0).pick_kind(&mut rng),
            QuestionKind::Illustration
        );
    }

    #[test]
    fn negative_weights_are_invalid() {
        assert!(Weights::new(33.0, 33.0, 33.0).is_valid());
        assert!(Weights::new(0.0, 0.0, 0.0).is_valid());
        assert!(!Weights::new(-1.0, 33.0, 33.0).is_valid());
        assert!(!Weights::new(f64::NAN, 33.0, 33.0).is_valid());
        assert!(!Weights::new(1e308, 1e308, 1e308).is_valid());
    }

    #[test]
    fn masked_name_strips_rarity_suffix() {
        assert_eq!(masked_name(&character(1, "Megan Cr", "cr", "")), "Megan");
        assert_eq!(masked_name(&character(1, "Vansaar Ld", "l", "")), "Vansaar");
        assert_eq!(masked_name(&character(1, "Ambre", "r", "")), "Ambre");
        assert_eq!(masked_name(&character(1, "Cr", "cr", "")), "Cr");
    }

    #[test]
    fn biography_hides_every_mention() {
        let mut megan = character(1, "Megan Cr", "cr", "");
        megan.description = "Megan is shy.\nMegan Cr became a star. Megan Mt too.".to_owned();

        assert_eq!(
            redacted_biography(&megan),
            "??? is shy.\n> ??? became a star. ??? too."
        );
    }

    #[test]
    fn biography_escapes_regex_characters() {
        let mut odd = character(1, "Dr. (No)", "r", "");
        odd.description = "Dr. (No) laughs. Drx (No) does not.".to_owned();

        assert_eq!(redacted_biography(&odd), "??? laughs. Drx (No) does not.");
    }

    #[tokio::test]
    async fn illustration_uses_level_name_and_picture() {
        let source = FakeSource::new(sample_pool());
        let generator = QuestionGenerator::new(source);
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..20 {
            let (question, response) = generator
                .generate(&Weights::new(100.0, 0.0, 0.0), &mut rng)
                .await
                .unwrap();
            assert_eq!(question.kind, QuestionKind::Illustration);
            assert_eq!(question.text, ILLUSTRATION_PROMPT);

            let picture = question.picture.unwrap();
            let level: u32 = picture
                .rsplit('/')
                .next()
                .and_then(|file| file.strip_suffix(".png"))
                .and_then(|level| level.parse().ok())
                .unwrap();
            assert!((2..=5).contains(&level));
            assert!(picture.contains(&format!("/{}/", response.character.id)));
            assert_ne!(response.expected, response.character.name);
            assert_eq!(
                response.expected,
                format!("{} L{}", response.character.name, level)
            );
        }
    }

    #[tokio::test]
    async fn ability_only_uses_unique_abilities() {
        let generator = QuestionGenerator::new(FakeSource::new(sample_pool()));
        let mut rng = StdRng::seed_from_u64(5);

        for _ in 0..20 {
            let (question, response) = generator
                .generate(&Weights::new(0.0, 0.0, 100.0), &mut rng)
                .await
                .unwrap();
            assert_eq!(question.kind, QuestionKind::Ability);
            assert_ne!(response.character.ability, "Power +2");
            assert!(question.text.ends_with(&response.character.ability));
        }
    }

    #[tokio::test]
    async fn ability_without_unique_character_is_an_error() {
        let pool = vec![
            character(1, "Ambre", "r", "Attack +8"),
            character(2, "Eyrton", "u", "Attack +8"),
        ];
        let generator = QuestionGenerator::new(FakeSource::new(pool));
        let mut rng = StdRng::seed_from_u64(5);

        let result = generator
            .generate(&Weights::new(0.0, 0.0, 100.0), &mut rng)
            .await;
        assert!(matches!(result, Err(GenerateError::NoUniqueAbility)));
    }

    #[tokio::test]
    async fn empty_pool_is_an_error() {
        let generator = QuestionGenerator::new(FakeSource::new(Vec::new()));
        let mut rng = StdRng::seed_from_u64(5);

        for weights in [
            Weights::new(100.0, 0.0, 0.0),
            Weights::new(0.0, 100.0, 0.0),
            Weights::new(0.0, 0.0, 100.0),
        ] {
            let result = generator.generate(&weights, &mut rng).await;
            assert!(matches!(result, Err(GenerateError::EmptyPool)));
        }
    }

    #[tokio::test]
    async fn source_errors_propagate() {
        let generator = QuestionGenerator::new(Arc::new(BrokenSource));
        let mut rng = StdRng::seed_from_u64(5);

        let result = generator
            .generate_many(3, &Weights::new(33.0, 33.0, 33.0), &mut rng)
            .await;
        assert!(matches!(result, Err(GenerateError::Source(_))));
    }

    #[tokio::test]
    async fn pool_is_fetched_once() {
        let source = FakeSource::new(sample_pool());
        let generator = QuestionGenerator::new(source.clone());
        let mut rng = StdRng::seed_from_u64(9);
        let weights = Weights::new(33.0, 33.0, 33.0);

        generator.generate_many(6, &weights, &mut rng).await.unwrap();
        generator.generate(&weights, &mut rng).await.unwrap();

        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn batch_matches_sequential_order() {
        let weights = Weights::new(33.0, 33.0, 33.0);

        let batch = QuestionGenerator::new(FakeSource::new(sample_pool()))
            .generate_many(12, &weights, &mut StdRng::seed_from_u64(42))
            .await
            .unwrap();

        let generator = QuestionGenerator::new(FakeSource::new(sample_pool()));
        let mut rng = StdRng::seed_from_u64(42);
        let mut sequential = Vec::new();
        for _ in 0..12 {
            sequential.push(generator.generate(&weights, &mut rng).await.unwrap());
        }

        assert_eq!(batch, sequential);
    }
}
