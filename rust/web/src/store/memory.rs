use super::{parse_id, Store, StoreError, RULESET_COLLECTION, SESSION_COLLECTION};
use async_trait::async_trait;
use athena_model::{RecordId, Ruleset, Session};
use std::sync::RwLock;

/// In-process store keeping documents in insertion order
#[derive(Debug, Default)]
pub struct MemoryStore {
    rulesets: RwLock<Vec<Ruleset>>,
    sessions: RwLock<Vec<Session>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn all_rulesets(&self) -> Result<Vec<Ruleset>, StoreError> {
        let rulesets = self
            .rulesets
            .read()
            .map_err(|_| StoreError::StoragePoisoned)?;
        Ok(rulesets.clone())
    }

    async fn all_sessions(&self) -> Result<Vec<Session>, StoreError> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| StoreError::StoragePoisoned)?;
        Ok(sessions.clone())
    }

    async fn ruleset_by_id(&self, id: &str) -> Result<Ruleset, StoreError> {
        let record_id = parse_id(RULESET_COLLECTION, id)?;
        let rulesets = self
            .rulesets
            .read()
            .map_err(|_| StoreError::StoragePoisoned)?;
        rulesets
            .iter()
            .find(|r| r.id == record_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                collection: RULESET_COLLECTION,
                id: id.to_string(),
            })
    }

    async fn session_by_id(&self, id: &str) -> Result<Session, StoreError> {
        let record_id = parse_id(SESSION_COLLECTION, id)?;
        let sessions = self
            .sessions
            .read()
            .map_err(|_| StoreError::StoragePoisoned)?;
        sessions
            .iter()
            .find(|s| s.id == record_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                collection: SESSION_COLLECTION,
                id: id.to_string(),
            })
    }

    async fn insert_ruleset(&self, ruleset: &Ruleset) -> Result<(), StoreError> {
        let mut rulesets = self
            .rulesets
            .write()
            .map_err(|_| StoreError::StoragePoisoned)?;
        if rulesets.iter().any(|r| r.id == ruleset.id) {
            return Err(StoreError::Backend(format!(
                "duplicate key {} in {}",
                ruleset.id, RULESET_COLLECTION
            )));
        }
        rulesets.push(ruleset.clone());
        Ok(())
    }

    async fn insert_session(&self, session: &Session) -> Result<(), StoreError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| StoreError::StoragePoisoned)?;
        if sessions.iter().any(|s| s.id == session.id) {
            return Err(StoreError::Backend(format!(
                "duplicate key {} in {}",
                session.id, SESSION_COLLECTION
            )));
        }
        sessions.push(session.clone());
        Ok(())
    }

    async fn replace_ruleset(&self, ruleset: &Ruleset) -> Result<(), StoreError> {
        let mut rulesets = self
            .rulesets
            .write()
            .map_err(|_| StoreError::StoragePoisoned)?;
        let slot = rulesets
            .iter_mut()
            .find(|r| r.id == ruleset.id)
            .ok_or_else(|| StoreError::NotFound {
                collection: RULESET_COLLECTION,
                id: ruleset.id.to_hex(),
            })?;
        *slot = ruleset.clone();
        Ok(())
    }

    async fn replace_session(&self, session: &Session) -> Result<(), StoreError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| StoreError::StoragePoisoned)?;
        let slot = sessions
            .iter_mut()
            .find(|s| s.id == session.id)
            .ok_or_else(|| StoreError::NotFound {
                collection: SESSION_COLLECTION,
                id: session.id.to_hex(),
            })?;
        *slot = session.clone();
        Ok(())
    }

    async fn increment_ruleset_usage(&self, id: RecordId) -> Result<Ruleset, StoreError> {
        let mut rulesets = self
            .rulesets
            .write()
            .map_err(|_| StoreError::StoragePoisoned)?;
        let ruleset = rulesets
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound {
                collection: RULESET_COLLECTION,
                id: id.to_hex(),
            })?;
        ruleset.used_in_games += 1;
        Ok(ruleset.clone())
    }

    async fn delete_session(&self, id: RecordId) -> Result<(), StoreError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| StoreError::StoragePoisoned)?;
        let before = sessions.len();
        sessions.retain(|s| s.id != id);
        if sessions.len() == before {
            return Err(StoreError::NotFound {
                collection: SESSION_COLLECTION,
                id: id.to_hex(),
            });
        }
        Ok(())
    }

    async fn reset(&self) -> Result<(), StoreError> {
        self.rulesets
            .write()
            .map_err(|_| StoreError::StoragePoisoned)?
            .clear();
        self.sessions
            .write()
            .map_err(|_| StoreError::StoragePoisoned)?
            .clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use athena_model::{PlayerUpdate, SessionUpdate, StatType, StatValue};
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn munchkin() -> Ruleset {
        let mut rules = Ruleset::new("Munchkin", "Classic");
        rules
            .add_stat("playerLevel", "Player Level", StatType::Int, StatValue::Int(1))
            .expect("stat");
        rules
    }

    #[tokio::test]
    async fn lists_in_insertion_order() {
        let store = MemoryStore::new();
        let first = munchkin();
        let second = Ruleset::new("Catan", "Base");
        store.insert_ruleset(&first).await.expect("insert first");
        store.insert_ruleset(&second).await.expect("insert second");

        let all = store.all_rulesets().await.expect("list");
        assert_eq!(all, vec![first, second]);
    }

    #[tokio::test]
    async fn malformed_and_absent_ids_are_both_not_found() {
        let store = MemoryStore::new();
        let absent = RecordId::new().to_hex();

        for id in ["not-an-id", absent.as_str()] {
            let err = store.ruleset_by_id(id).await.expect_err("missing");
            assert!(err.is_not_found(), "{id}: {err}");
            let err = store.session_by_id(id).await.expect_err("missing");
            assert!(err.is_not_found(), "{id}: {err}");
        }
    }

    #[tokio::test]
    async fn replace_requires_existing_record() {
        let store = MemoryStore::new();
        let rules = munchkin();
        let err = store.replace_ruleset(&rules).await.expect_err("absent");
        assert!(err.is_not_found());

        store.insert_ruleset(&rules).await.expect("insert");
        let mut renamed = rules.clone();
        renamed.name = "Epic".into();
        store.replace_ruleset(&renamed).await.expect("replace");
        let stored = store.ruleset_by_id(&rules.id.to_hex()).await.expect("get");
        assert_eq!(stored.name, "Epic");
    }

    #[tokio::test]
    async fn increments_usage_counter() {
        let store = MemoryStore::new();
        let rules = munchkin();
        store.insert_ruleset(&rules).await.expect("insert");

        store.increment_ruleset_usage(rules.id).await.expect("first");
        let updated = store.increment_ruleset_usage(rules.id).await.expect("second");
        assert_eq!(updated.used_in_games, 2);
    }

    #[tokio::test]
    async fn update_session_merges_stats() {
        let store = MemoryStore::new();
        let rules = munchkin();
        let session = Session::start(&rules, &["a".to_string()], Utc::now());
        store.insert_session(&session).await.expect("insert");

        let update = SessionUpdate {
            players: vec![PlayerUpdate {
                name: "a".into(),
                stats: BTreeMap::from([("playerLevel".to_string(), StatValue::Int(6))]),
            }],
        };
        store
            .update_session(&session.id.to_hex(), &update)
            .await
            .expect("update");

        let stored = store.session_by_id(&session.id.to_hex()).await.expect("get");
        assert_eq!(stored.players[0].stats["playerLevel"], StatValue::Int(6));
    }

    #[tokio::test]
    async fn update_of_missing_session_fails() {
        let store = MemoryStore::new();
        let err = store
            .update_session(&RecordId::new().to_hex(), &SessionUpdate::default())
            .await
            .expect_err("missing");
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn reset_empties_both_collections() {
        let store = MemoryStore::new();
        let rules = munchkin();
        store.insert_ruleset(&rules).await.expect("insert ruleset");
        store
            .insert_session(&Session::start(&rules, &[], Utc::now()))
            .await
            .expect("insert session");

        store.reset().await.expect("reset");
        assert!(store.all_rulesets().await.expect("rulesets").is_empty());
        assert!(store.all_sessions().await.expect("sessions").is_empty());
    }
}
