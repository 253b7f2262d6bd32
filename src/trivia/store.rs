use crate::trivia::session::TriviaSession;
use serenity::all::ChannelId;
use std::collections::HashMap;

/// Identifies one session instance, so that delayed work can tell whether the
/// session it was scheduled for has since been replaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionId(u64);

struct Slot {
    id: SessionId,
    session: TriviaSession,
}

/// At most one trivia session per channel.
#[derive(Default)]
pub struct SessionStore {
    slots: HashMap<ChannelId, Slot>,
    next_id: u64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, channel_id: ChannelId) -> Option<&TriviaSession> {
        self.slots.get(&channel_id).map(|slot| &slot.session)
    }

    pub fn get_mut(&mut self, channel_id: ChannelId) -> Option<&mut TriviaSession> {
        self.slots.get_mut(&channel_id).map(|slot| &mut slot.session)
    }

    /// The channel's session, only if it is still the instance `id` refers to.
    pub fn get_if(&mut self, channel_id: ChannelId, id: SessionId) -> Option<&mut TriviaSession> {
        self.slots
            .get_mut(&channel_id)
            .filter(|slot| slot.id == id)
            .map(|slot| &mut slot.session)
    }

    pub fn id(&self, channel_id: ChannelId) -> Option<SessionId> {
        self.slots.get(&channel_id).map(|slot| slot.id)
    }

    pub fn is_running(&self, channel_id: ChannelId) -> bool {
        self.get(channel_id)
            .is_some_and(|session| session.is_running())
    }

    /// Install `session` in the channel, discarding any previous one.
    pub fn replace(&mut self, channel_id: ChannelId, session: TriviaSession) -> SessionId {
        self.next_id += 1;
        let id = SessionId(self.next_id);
        self.slots.insert(channel_id, Slot { id, session });
        id
    }

    /// Remove the channel's session, only if it is still the instance `id` refers to.
    pub fn remove_if(&mut self, channel_id: ChannelId, id: SessionId) -> Option<TriviaSession> {
        if self.id(channel_id) != Some(id) {
            return None;
        }
        self.slots.remove(&channel_id).map(|slot| slot.session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trivia::{
        question::{
            tests::{sample_pool, FakeSource},
            Weights,
        },
        session::{ChannelKind, RoundAdvance, TriviaSettings},
    };

    fn session() -> TriviaSession {
        let settings = TriviaSettings {
            rounds: 2,
            weights: Weights::new(33.0, 33.0, 33.0),
        };
        TriviaSession::new(settings, ChannelKind::Text, FakeSource::new(sample_pool())).unwrap()
    }

    #[test]
    fn replace_discards_previous_session() {
        let channel = ChannelId::new(7);
        let mut store = SessionStore::new();
        assert!(!store.is_running(channel));

        let first = store.replace(channel, session());
        assert!(store.is_running(channel));
        store.get_mut(channel).unwrap().stop();
        assert!(!store.is_running(channel));

        let second = store.replace(channel, session());
        assert_ne!(first, second);
        assert_eq!(store.id(channel), Some(second));
        assert!(store.is_running(channel));
        assert!(store.get_if(channel, first).is_none());
        assert!(store.get_if(channel, second).is_some());
    }

    #[test]
    fn channels_are_independent() {
        let mut store = SessionStore::new();
        let id = store.replace(ChannelId::new(1), session());

        assert!(store.is_running(ChannelId::new(1)));
        assert!(store.get(ChannelId::new(2)).is_none());
        assert!(store.remove_if(ChannelId::new(2), id).is_none());

        assert!(store.remove_if(ChannelId::new(1), id).is_some());
        assert!(store.get(ChannelId::new(1)).is_none());
    }

    #[test]
    fn unshown_game_is_removed_without_touching_its_successor() {
        let channel = ChannelId::new(3);
        let mut store = SessionStore::new();

        // A game whose first question could not be shown frees the channel
        let failed = store.replace(channel, session());
        assert!(store.remove_if(channel, failed).is_some());
        assert!(!store.is_running(channel));

        // A late cleanup for an older game leaves the current one alone
        let current = store.replace(channel, session());
        assert!(store.remove_if(channel, failed).is_none());
        assert_eq!(store.id(channel), Some(current));
        assert!(store.is_running(channel));
    }

    #[test]
    fn unshown_question_stops_only_its_own_game() {
        let channel = ChannelId::new(4);
        let mut store = SessionStore::new();
        let stale = store.replace(channel, session());
        let current = store.replace(channel, session());

        assert!(store.get_if(channel, stale).is_none());
        if let Some(session) = store.get_if(channel, current) {
            session.stop();
        }
        assert!(!store.is_running(channel));
        assert_eq!(store.get_if(channel, current).unwrap().advance_round(), RoundAdvance::Inactive);
    }
}
