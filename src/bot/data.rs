use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use dashmap::{DashMap, DashSet};
use sqlx::SqlitePool;

use crate::config::Settings;
use crate::services::moderation::automod::StrikeTracker;
use crate::services::music::registry::PlayerRegistry;
use crate::services::music::resolver::SourceResolver;

/// Shared data available to all commands and handlers
pub struct Data {
    pub pool: SqlitePool,
    pub settings: Settings,
    /// One audio player per guild
    pub players: PlayerRegistry,
    /// Turns search queries and URLs into playable tracks
    pub resolver: Arc<dyn SourceResolver>,
    /// Last XP grant per user
    pub xp_cooldowns: DashMap<u64, Instant>,
    /// Banned-word strikes per user
    pub strikes: StrikeTracker,
    /// Users with an application interview in flight
    pub open_applications: DashSet<u64>,
}

impl Data {
    pub fn new(pool: SqlitePool, settings: Settings, resolver: Arc<dyn SourceResolver>) -> Self {
        Self {
            pool,
            settings,
            players: PlayerRegistry::new(),
            resolver,
            xp_cooldowns: DashMap::new(),
            strikes: StrikeTracker::default(),
            open_applications: DashSet::new(),
        }
    }
}

impl fmt::Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Data")
            .field("active_players", &self.players.len())
            .field("xp_cooldowns", &self.xp_cooldowns.len())
            .finish_non_exhaustive()
    }
}

pub type Context<'a> = poise::Context<'a, Arc<Data>, crate::bot::error::Error>;
