use super::{parse_id, Store, StoreError, RULESET_COLLECTION, SESSION_COLLECTION};
use async_trait::async_trait;
use athena_model::{RecordId, Ruleset, Session};
use futures_util::TryStreamExt;
use mongodb::bson::{self, doc, Document};
use mongodb::options::ReturnDocument;
use mongodb::{Client, Collection, Database};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Store backed by a MongoDB database.
///
/// Records are written as their serde encoding with the id moved to `_id`
/// as a native ObjectId.
#[derive(Debug, Clone)]
pub struct MongoStore {
    database: Database,
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await?;
        let database = client.database(database);
        database.run_command(doc! { "ping": 1 }).await?;
        tracing::info!(database = %database.name(), "connected to MongoDB");
        Ok(Self { database })
    }

    fn rulesets(&self) -> Collection<Document> {
        self.database.collection(RULESET_COLLECTION)
    }

    fn sessions(&self) -> Collection<Document> {
        self.database.collection(SESSION_COLLECTION)
    }

    async fn find_all<T: DeserializeOwned>(
        collection: Collection<Document>,
    ) -> Result<Vec<T>, StoreError> {
        let documents: Vec<Document> = collection.find(doc! {}).await?.try_collect().await?;
        documents.into_iter().map(decode).collect()
    }

    async fn find_by_id<T: DeserializeOwned>(
        collection: Collection<Document>,
        collection_name: &'static str,
        id: &str,
    ) -> Result<T, StoreError> {
        let record_id = parse_id(collection_name, id)?;
        let document = collection
            .find_one(doc! { "_id": record_id.object_id() })
            .await?
            .ok_or_else(|| StoreError::NotFound {
                collection: collection_name,
                id: id.to_string(),
            })?;
        decode(document)
    }

    async fn replace<T: Serialize>(
        collection: Collection<Document>,
        collection_name: &'static str,
        id: RecordId,
        record: &T,
    ) -> Result<(), StoreError> {
        let result = collection
            .replace_one(doc! { "_id": id.object_id() }, encode(record, id)?)
            .await?;
        if result.matched_count == 0 {
            return Err(StoreError::NotFound {
                collection: collection_name,
                id: id.to_hex(),
            });
        }
        Ok(())
    }
}

fn encode<T: Serialize>(record: &T, id: RecordId) -> Result<Document, StoreError> {
    let mut document =
        bson::to_document(record).map_err(|err| StoreError::Encoding(err.to_string()))?;
    document.remove("id");
    document.insert("_id", id.object_id());
    Ok(document)
}

fn decode<T: DeserializeOwned>(mut document: Document) -> Result<T, StoreError> {
    let oid = document
        .get_object_id("_id")
        .map_err(|err| StoreError::Encoding(format!("document _id: {err}")))?;
    document.remove("_id");
    document.insert("id", oid.to_hex());
    bson::from_document(document).map_err(|err| StoreError::Encoding(err.to_string()))
}

#[async_trait]
impl Store for MongoStore {
    async fn all_rulesets(&self) -> Result<Vec<Ruleset>, StoreError> {
        Self::find_all(self.rulesets()).await
    }

    async fn all_sessions(&self) -> Result<Vec<Session>, StoreError> {
        Self::find_all(self.sessions()).await
    }

    async fn ruleset_by_id(&self, id: &str) -> Result<Ruleset, StoreError> {
        Self::find_by_id(self.rulesets(), RULESET_COLLECTION, id).await
    }

    async fn session_by_id(&self, id: &str) -> Result<Session, StoreError> {
        Self::find_by_id(self.sessions(), SESSION_COLLECTION, id).await
    }

    async fn insert_ruleset(&self, ruleset: &Ruleset) -> Result<(), StoreError> {
        self.rulesets()
            .insert_one(encode(ruleset, ruleset.id)?)
            .await?;
        Ok(())
    }

    async fn insert_session(&self, session: &Session) -> Result<(), StoreError> {
        self.sessions()
            .insert_one(encode(session, session.id)?)
            .await?;
        Ok(())
    }

    async fn replace_ruleset(&self, ruleset: &Ruleset) -> Result<(), StoreError> {
        Self::replace(self.rulesets(), RULESET_COLLECTION, ruleset.id, ruleset).await
    }

    async fn replace_session(&self, session: &Session) -> Result<(), StoreError> {
        Self::replace(self.sessions(), SESSION_COLLECTION, session.id, session).await
    }

    async fn increment_ruleset_usage(&self, id: RecordId) -> Result<Ruleset, StoreError> {
        let document = self
            .rulesets()
            .find_one_and_update(
                doc! { "_id": id.object_id() },
                doc! { "$inc": { "usedInGames": 1_i64 } },
            )
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                collection: RULESET_COLLECTION,
                id: id.to_hex(),
            })?;
        decode(document)
    }

    async fn delete_session(&self, id: RecordId) -> Result<(), StoreError> {
        let result = self
            .sessions()
            .delete_one(doc! { "_id": id.object_id() })
            .await?;
        if result.deleted_count == 0 {
            return Err(StoreError::NotFound {
                collection: SESSION_COLLECTION,
                id: id.to_hex(),
            });
        }
        Ok(())
    }

    async fn reset(&self) -> Result<(), StoreError> {
        for name in [RULESET_COLLECTION, SESSION_COLLECTION] {
            self.database.collection::<Document>(name).drop().await?;
            self.database.create_collection(name).await?;
        }
        tracing::warn!(database = %self.database.name(), "collections reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use athena_model::{StatType, StatValue};
    use chrono::Utc;

    #[test]
    fn encode_moves_id_to_object_id() {
        let mut rules = Ruleset::new("Munchkin", "Classic");
        rules
            .add_stat("playerLevel", "Player Level", StatType::Int, StatValue::Int(1))
            .expect("stat");

        let document = encode(&rules, rules.id).expect("encode");
        assert!(document.get("id").is_none());
        assert_eq!(
            document.get_object_id("_id").expect("_id"),
            rules.id.object_id()
        );
        assert_eq!(document.get_str("ruleset").expect("ruleset"), "Classic");
    }

    #[test]
    fn decode_restores_the_record() {
        let mut rules = Ruleset::new("Munchkin", "Classic");
        rules
            .add_stat("battleStrength", "Battle Level", StatType::Int, StatValue::Int(0))
            .expect("stat");
        let session = Session::start(&rules, &["atla".to_string()], Utc::now());

        let decoded: Ruleset = decode(encode(&rules, rules.id).expect("encode")).expect("decode");
        assert_eq!(decoded.id, rules.id);
        assert_eq!(decoded.stats, rules.stats);

        let decoded: Session =
            decode(encode(&session, session.id).expect("encode")).expect("decode");
        assert_eq!(decoded.players, session.players);
        assert_eq!(decoded.ruleset_id, rules.id);
    }

    #[test]
    fn decode_requires_object_id() {
        let document = doc! { "_id": "plain-string", "game": "Munchkin" };
        let result: Result<Ruleset, _> = decode(document);
        assert!(matches!(result, Err(StoreError::Encoding(_))));
    }
}
