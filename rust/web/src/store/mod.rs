//! Data access layer for rulesets and sessions.
//!
//! Two independent collections, `ruleset` and `session`, with no
//! cross-collection transactions. Every operation is a single-document read
//! or write; nothing is retried.

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use async_trait::async_trait;
use athena_model::{ModelError, RecordId, Ruleset, Session, SessionUpdate};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub const RULESET_COLLECTION: &str = "ruleset";
pub const SESSION_COLLECTION: &str = "session";

#[derive(Debug, Error)]
pub enum StoreError {
    /// Absent record, or an id that is not a valid record id
    #[error("no {collection} with id {id}")]
    NotFound {
        collection: &'static str,
        id: String,
    },
    #[error("Update rejected: {0}")]
    Rejected(#[from] ModelError),
    #[error("Document encoding failed: {0}")]
    Encoding(String),
    #[error("Storage backend error: {0}")]
    Backend(String),
    #[error("Store lock poisoned")]
    StoragePoisoned,
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Parses a client-supplied id. Malformed ids are reported exactly like
/// absent ones.
pub(crate) fn parse_id(collection: &'static str, raw: &str) -> Result<RecordId, StoreError> {
    RecordId::parse(raw).map_err(|_| StoreError::NotFound {
        collection,
        id: raw.to_string(),
    })
}

#[async_trait]
pub trait Store: Send + Sync + fmt::Debug {
    /// All rulesets in natural storage order
    async fn all_rulesets(&self) -> Result<Vec<Ruleset>, StoreError>;

    /// All sessions in natural storage order
    async fn all_sessions(&self) -> Result<Vec<Session>, StoreError>;

    async fn ruleset_by_id(&self, id: &str) -> Result<Ruleset, StoreError>;

    async fn session_by_id(&self, id: &str) -> Result<Session, StoreError>;

    async fn insert_ruleset(&self, ruleset: &Ruleset) -> Result<(), StoreError>;

    async fn insert_session(&self, session: &Session) -> Result<(), StoreError>;

    /// Full-document replace keyed by `ruleset.id`
    async fn replace_ruleset(&self, ruleset: &Ruleset) -> Result<(), StoreError>;

    /// Full-document replace keyed by `session.id`
    async fn replace_session(&self, session: &Session) -> Result<(), StoreError>;

    /// Adds one to the usage counter in a single store operation and
    /// returns the updated ruleset.
    async fn increment_ruleset_usage(&self, id: RecordId) -> Result<Ruleset, StoreError>;

    async fn delete_session(&self, id: RecordId) -> Result<(), StoreError>;

    /// Drops and recreates both collections.
    async fn reset(&self) -> Result<(), StoreError>;

    /// Merges player stats from `update` into the stored session and writes
    /// the whole session back.
    async fn update_session(
        &self,
        id: &str,
        update: &SessionUpdate,
    ) -> Result<Session, StoreError> {
        let mut session = self.session_by_id(id).await?;
        session.apply_update(update)?;
        self.replace_session(&session).await?;
        Ok(session)
    }
}

/// Which backend the server runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StoreKind {
    Mongo,
    Memory,
}

/// Opens the configured store. For MongoDB this connects and pings the
/// server, so an unreachable database fails here rather than on first use.
pub async fn connect(
    kind: StoreKind,
    uri: &str,
    database: &str,
) -> Result<Arc<dyn Store>, StoreError> {
    match kind {
        StoreKind::Mongo => {
            let store = MongoStore::connect(uri, database).await?;
            Ok(Arc::new(store))
        }
        StoreKind::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}
