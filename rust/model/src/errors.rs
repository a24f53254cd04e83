use crate::stat::StatType;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("Invalid record id: {0}")]
    InvalidId(String),
    #[error("Duplicate stat name: {0}")]
    DuplicateStat(String),
    #[error("Stat {0} needs a type or a default value")]
    UntypedStat(String),
    #[error("Default value of stat {stat} must be {expected}, found {found}")]
    DefaultTypeMismatch {
        stat: String,
        expected: StatType,
        found: StatType,
    },
    #[error("Player {player} has no stat {stat}")]
    UnknownStat { player: String, stat: String },
    #[error("Stat {stat} of player {player} must be {expected}, found {found}")]
    StatTypeMismatch {
        player: String,
        stat: String,
        expected: StatType,
        found: StatType,
    },
}
