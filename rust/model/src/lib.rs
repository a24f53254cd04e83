//! # athena-model: Ruleset and Session Records
//!
//! Plain data records for tracking tabletop game sessions. A [`Ruleset`]
//! describes which stats a game tracks and how players are ranked, a
//! [`Session`] is one play-through of a ruleset with per-player stat values.
//!
//! ## Core Modules
//!
//! - [`ids`] - Record identifiers (ObjectId-backed, hex encoded in JSON)
//! - [`stat`] - Stat definitions and the closed set of stat value types
//! - [`ruleset`] - Rulesets and the create-ruleset draft payload
//! - [`session`] - Sessions, players, session start and merge-update payloads
//! - [`errors`] - Error types for record validation
//!
//! ## Quick Start
//!
//! ```rust
//! use athena_model::ruleset::Ruleset;
//! use athena_model::session::Session;
//! use athena_model::stat::{StatType, StatValue};
//! use chrono::Utc;
//!
//! let mut rules = Ruleset::new("Munchkin", "Classic");
//! rules
//!     .add_stat("playerLevel", "Player Level", StatType::Int, StatValue::Int(1))
//!     .unwrap();
//!
//! let session = Session::start(&rules, &["atla".to_string()], Utc::now());
//! assert_eq!(session.players[0].stats["playerLevel"], StatValue::Int(1));
//! ```

pub mod errors;
pub mod ids;
pub mod ruleset;
pub mod session;
pub mod stat;

pub use errors::ModelError;
pub use ids::RecordId;
pub use ruleset::{Ruleset, RulesetDraft};
pub use session::{
    Player, PlayerUpdate, Session, SessionStart, SessionUpdate, DEFAULT_ACTIVE_MINUTES,
};
pub use stat::{Stat, StatDraft, StatType, StatValue};
