use crate::errors::ModelError;
use crate::ids::RecordId;
use crate::ruleset::Ruleset;
use crate::stat::StatValue;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Active duration, in minutes, given to every newly started session.
pub const DEFAULT_ACTIVE_MINUTES: u32 = 5;

/// One play-through of a ruleset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: RecordId,
    /// Derived from `start_date` and `duration_active`; see [`Session::is_active_at`]
    #[serde(default)]
    pub is_active: bool,
    pub start_date: DateTime<Utc>,
    /// Active duration in minutes
    pub duration_active: u32,
    /// Ruleset the session was started with. Checked when the session starts,
    /// tolerated as a dangling reference afterwards.
    #[serde(rename = "ruleset")]
    pub ruleset_id: RecordId,
    #[serde(default)]
    pub players: Vec<Player>,
}

impl Session {
    pub fn new(start_date: DateTime<Utc>, duration_active: u32, ruleset_id: RecordId) -> Self {
        Self {
            id: RecordId::new(),
            is_active: true,
            start_date,
            duration_active,
            ruleset_id,
            players: Vec::new(),
        }
    }

    /// Starts a session of `ruleset` with one player per name, each seeded
    /// with the ruleset's stat defaults.
    pub fn start(ruleset: &Ruleset, player_names: &[String], now: DateTime<Utc>) -> Self {
        let mut session = Self::new(now, DEFAULT_ACTIVE_MINUTES, ruleset.id);
        for name in player_names {
            session.add_player(Player::seeded(name.clone(), ruleset));
        }
        session
    }

    pub fn add_player(&mut self, player: Player) {
        self.players.push(player);
    }

    /// A session counts as active once more than `duration_active` minutes
    /// have elapsed since `start_date`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        let elapsed = now.signed_duration_since(self.start_date);
        elapsed > TimeDelta::minutes(i64::from(self.duration_active))
    }

    pub fn refresh_activity(&mut self, now: DateTime<Utc>) {
        self.is_active = self.is_active_at(now);
    }

    /// Merges updated player stats into this session.
    ///
    /// Every stat key in the update overwrites the value of the player with
    /// the same name. Players unknown to the session are skipped. The update
    /// is applied all-or-nothing: a key the player does not track, or a value
    /// of the wrong type, rejects the whole update.
    pub fn apply_update(&mut self, update: &SessionUpdate) -> Result<(), ModelError> {
        let mut players = self.players.clone();

        for change in &update.players {
            for player in players.iter_mut().filter(|p| p.name == change.name) {
                for (key, value) in &change.stats {
                    player.set_stat(key, value)?;
                }
            }
        }

        self.players = players;
        Ok(())
    }

    pub fn player(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name == name)
    }
}

/// A player of a session and their current stat values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Join key for merge-updates; not guaranteed unique
    pub name: String,
    #[serde(default)]
    pub stats: BTreeMap<String, StatValue>,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stats: BTreeMap::new(),
        }
    }

    pub fn seeded(name: impl Into<String>, ruleset: &Ruleset) -> Self {
        let mut player = Self::new(name);
        for stat in &ruleset.stats {
            player
                .stats
                .insert(stat.name.clone(), stat.default_value.clone());
        }
        player
    }

    fn set_stat(&mut self, key: &str, value: &StatValue) -> Result<(), ModelError> {
        let current = self
            .stats
            .get_mut(key)
            .ok_or_else(|| ModelError::UnknownStat {
                player: self.name.clone(),
                stat: key.to_string(),
            })?;

        let expected = current.stat_type();
        *current = expected
            .coerce(value)
            .ok_or_else(|| ModelError::StatTypeMismatch {
                player: self.name.clone(),
                stat: key.to_string(),
                expected,
                found: value.stat_type(),
            })?;
        Ok(())
    }
}

/// Request payload for starting a session. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStart {
    /// Id of the ruleset to play
    #[serde(default)]
    pub ruleset: String,
    #[serde(default)]
    pub players: Vec<String>,
}

impl SessionStart {
    pub fn new(ruleset: impl Into<String>, players: Vec<String>) -> Self {
        Self {
            ruleset: ruleset.into(),
            players,
        }
    }
}

/// Partial session accepted by the merge-update. Fields of a full session
/// other than `players` are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionUpdate {
    #[serde(default)]
    pub players: Vec<PlayerUpdate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerUpdate {
    pub name: String,
    #[serde(default)]
    pub stats: BTreeMap<String, StatValue>,
}
