use serenity::all::UserId;

/// Per-session player scores.
///
/// Entries are kept in the order players first scored, so ties in the ranking
/// keep that order.
#[derive(Default, Debug, Clone)]
pub struct ScoreBoard(Vec<(UserId, u32)>);

impl ScoreBoard {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Add one point to `player`, returning the new score.
    pub fn increment(&mut self, player: UserId) -> u32 {
        match self.0.iter_mut().find(|(id, _)| *id == player) {
            Some((_, score)) => {
                *score += 1;
                *score
            }
            None => {
                self.0.push((player, 1));
                1
            }
        }
    }

    /// Players with their scores, best first.
    pub fn ranked(&self) -> Vec<(UserId, u32)> {
        let mut ranked = self.0.clone();
        // `sort_by` is stable
        ranked.sort_by(|(_, a), (_, b)| b.cmp(a));
        ranked
    }

}

#[cfg(test)]
impl ScoreBoard {
    pub fn score(&self, player: UserId) -> Option<u32> {
        self.0
            .iter()
            .find(|(id, _)| *id == player)
            .map(|(_, score)| *score)
    }

    pub fn ranked_player_ids(&self) -> Vec<UserId> {
        self.ranked().into_iter().map(|(id, _)| id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
