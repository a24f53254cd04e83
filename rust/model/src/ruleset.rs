use crate::errors::ModelError;
use crate::ids::RecordId;
use crate::stat::{Stat, StatDraft, StatType, StatValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Definition of the stats, ranking and win condition of a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ruleset {
    /// Assigned at creation, never reassigned
    pub id: RecordId,
    pub date_created: DateTime<Utc>,
    /// Name of the game (e.g. "Munchkin")
    pub game: String,
    /// Name of the ruleset variant (e.g. "Classic")
    #[serde(rename = "ruleset")]
    pub name: String,
    #[serde(default)]
    pub stats: Vec<Stat>,
    /// Free-form ranking expression, e.g. `{playerLevel} descending`
    #[serde(default)]
    pub ranking: String,
    /// Free-form win condition expression, e.g. `{playerLevel} > 9`
    #[serde(default)]
    pub win_condition: String,
    /// Number of sessions started with this ruleset
    #[serde(default)]
    pub used_in_games: i64,
}

impl Ruleset {
    pub fn new(game: impl Into<String>, name: impl Into<String>) -> Self {
        Self::with_identity(RecordId::new(), Utc::now(), game, name)
    }

    fn with_identity(
        id: RecordId,
        date_created: DateTime<Utc>,
        game: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            date_created,
            game: game.into(),
            name: name.into(),
            stats: Vec::new(),
            ranking: String::new(),
            win_condition: String::new(),
            used_in_games: 0,
        }
    }

    /// Builds a ruleset from a client draft, stamping a fresh id and `now`.
    pub fn from_draft(draft: RulesetDraft, now: DateTime<Utc>) -> Result<Self, ModelError> {
        let mut ruleset = Self::with_identity(RecordId::new(), now, draft.game, draft.ruleset);
        ruleset.ranking = draft.ranking;
        ruleset.win_condition = draft.win_condition;
        for stat in draft.stats {
            ruleset.push_stat(stat.into_stat()?)?;
        }
        Ok(ruleset)
    }

    pub fn add_stat(
        &mut self,
        name: impl Into<String>,
        label: impl Into<String>,
        stat_type: StatType,
        default_value: StatValue,
    ) -> Result<&mut Self, ModelError> {
        let stat = Stat::new(name, label, stat_type, default_value)?;
        self.push_stat(stat)?;
        Ok(self)
    }

    pub fn stat(&self, name: &str) -> Option<&Stat> {
        self.stats.iter().find(|s| s.name == name)
    }

    fn push_stat(&mut self, stat: Stat) -> Result<(), ModelError> {
        if self.stat(&stat.name).is_some() {
            return Err(ModelError::DuplicateStat(stat.name));
        }
        self.stats.push(stat);
        Ok(())
    }

    /// Checks the invariants a stored ruleset must hold.
    pub fn validate(&self) -> Result<(), ModelError> {
        let mut seen = HashSet::new();
        for stat in &self.stats {
            if !seen.insert(stat.name.as_str()) {
                return Err(ModelError::DuplicateStat(stat.name.clone()));
            }
            if stat.default_value.stat_type() != stat.stat_type {
                return Err(ModelError::DefaultTypeMismatch {
                    stat: stat.name.clone(),
                    expected: stat.stat_type,
                    found: stat.default_value.stat_type(),
                });
            }
        }
        Ok(())
    }
}

/// Create-ruleset payload.
///
/// Carries only what a client may choose. Identity, creation time and the
/// usage counter are always assigned by the server, so any such fields in
/// the request body are dropped on decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesetDraft {
    #[serde(default)]
    pub game: String,
    #[serde(default)]
    pub ruleset: String,
    #[serde(default)]
    pub stats: Vec<StatDraft>,
    #[serde(default)]
    pub ranking: String,
    #[serde(default)]
    pub win_condition: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn munchkin() -> Ruleset {
        let mut rules = Ruleset::new("Munchkin", "Classic");
        rules
            .add_stat("playerLevel", "Player Level", StatType::Int, StatValue::Int(1))
            .expect("playerLevel")
            .add_stat("itemLevel", "Item Level", StatType::Int, StatValue::Int(0))
            .expect("itemLevel");
        rules
    }

    #[test]
    fn new_ruleset_starts_unused() {
        let rules = munchkin();
        assert_eq!(rules.used_in_games, 0);
        assert_eq!(rules.stats.len(), 2);
        assert!(rules.validate().is_ok());
    }

    #[test]
    fn duplicate_stat_names_are_rejected() {
        let mut rules = munchkin();
        let err = rules
            .add_stat("playerLevel", "Again", StatType::Int, StatValue::Int(3))
            .expect_err("duplicate");
        assert_eq!(err, ModelError::DuplicateStat("playerLevel".into()));
        assert_eq!(rules.stats.len(), 2);
    }

    #[test]
    fn draft_ignores_client_identity() {
        let body = json!({
            "id": "5c1f0e3a9b1e4a2f3c4d5e6f",
            "dateCreated": "2001-01-01T00:00:00Z",
            "usedInGames": 41,
            "game": "Munchkin",
            "ruleset": "Classic",
            "stats": [{ "name": "playerLevel", "defaultValue": 1 }]
        });
        let draft: RulesetDraft = serde_json::from_value(body).expect("decode draft");
        let now = Utc::now();
        let rules = Ruleset::from_draft(draft, now).expect("build");

        assert_ne!(rules.id.to_hex(), "5c1f0e3a9b1e4a2f3c4d5e6f");
        assert_eq!(rules.date_created, now);
        assert_eq!(rules.used_in_games, 0);
        assert_eq!(rules.stat("playerLevel").map(|s| s.stat_type), Some(StatType::Int));
    }

    #[test]
    fn draft_with_duplicate_stats_fails() {
        let draft = RulesetDraft {
            game: "Munchkin".into(),
            ruleset: "Classic".into(),
            stats: vec![
                StatDraft {
                    name: "a".into(),
                    default_value: Some(StatValue::Int(1)),
                    ..Default::default()
                },
                StatDraft {
                    name: "a".into(),
                    default_value: Some(StatValue::Int(2)),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        assert_eq!(
            Ruleset::from_draft(draft, Utc::now()),
            Err(ModelError::DuplicateStat("a".into()))
        );
    }

    #[test]
    fn encodes_with_wire_field_names() {
        let rules = munchkin();
        let json = serde_json::to_value(&rules).expect("encode");
        assert_eq!(json["ruleset"], "Classic");
        assert_eq!(json["usedInGames"], 0);
        assert!(json["dateCreated"].is_string());
        assert_eq!(json["id"], rules.id.to_hex());
        assert!(json.get("winCondition").is_some());
    }
}
