use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::services::music::player::Player;
use crate::services::music::resolver::SourceResolver;
use crate::services::music::voice::VoiceSession;

/// Per-guild player table. Players insert themselves on spawn and remove
/// themselves through their teardown hook, so a guild never sees a stale
/// entry pointing at a dead playback loop.
#[derive(Clone, Default)]
pub struct PlayerRegistry {
    players: Arc<DashMap<u64, Arc<Player>>>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, guild_id: u64) -> Option<Arc<Player>> {
        self.players.get(&guild_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Start a player for the guild, replacing any previous entry.
    pub fn spawn(
        &self,
        guild_id: u64,
        session: Arc<dyn VoiceSession>,
        resolver: Arc<dyn SourceResolver>,
    ) -> Arc<Player> {
        let table = Arc::clone(&self.players);
        let player = Player::spawn(guild_id, session, resolver, move || {
            table.remove(&guild_id);
            debug!("Unregistered player for guild {}", guild_id);
        });
        self.players.insert(guild_id, Arc::clone(&player));
        player
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
