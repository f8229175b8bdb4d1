use std::sync::Arc;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use uuid::Uuid;

use podium_types::{now_ms, Tourney, TourneyStatus};

use super::{StoreError, TourneyStore};

const IDS_KEY: &str = "tourney:ids";
const TX_INDEX_KEY: &str = "tourney:tx";

/// Conditional overwrite. Commits the new document and moves the status
/// index only while the stored status still matches what the caller read.
const CAS_SCRIPT: &str = r#"
local raw = redis.call('GET', KEYS[1])
if not raw then
  return 0
end
local doc = cjson.decode(raw)
if doc['status'] ~= ARGV[1] then
  return 0
end
redis.call('SET', KEYS[1], ARGV[2])
if ARGV[1] ~= ARGV[3] then
  redis.call('SREM', KEYS[2], ARGV[4])
  redis.call('SADD', KEYS[3], ARGV[4])
end
return 1
"#;

/// Redis-backed store. Documents are JSON blobs at `tourney:{id}`, with a
/// set per status for the loops' queries and a hash mapping funding
/// transactions to tourney ids for the double-spend check.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    cas: Arc<Script>,
}

fn doc_key(id: &str) -> String {
    format!("tourney:{id}")
}

fn status_key(status: TourneyStatus) -> String {
    format!("tourney:status:{}", status.as_str())
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self {
            conn,
            cas: Arc::new(Script::new(CAS_SCRIPT)),
        })
    }

    async fn load_members(&self, ids: Vec<String>) -> Result<Vec<Tourney>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let keys: Vec<String> = ids.iter().map(|id| doc_key(id)).collect();
        let mut conn = self.conn.clone();
        let raw: Vec<Option<String>> = conn.mget(keys).await?;
        let mut tourneys = Vec::with_capacity(raw.len());
        for doc in raw.into_iter().flatten() {
            tourneys.push(serde_json::from_str(&doc)?);
        }
        Ok(tourneys)
    }
}

#[async_trait]
impl TourneyStore for RedisStore {
    async fn insert(&self, tourney: &mut Tourney) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        tourney.id = Uuid::new_v4().to_string();
        tourney.last_modified = now_ms();

        // HSETNX is the uniqueness gate: first writer claims the funding
        // transaction, everyone else gets the duplicate error.
        let claimed: bool = conn
            .hset_nx(TX_INDEX_KEY, &tourney.transaction_id, &tourney.id)
            .await?;
        if !claimed {
            return Err(StoreError::DuplicateTransaction(
                tourney.transaction_id.clone(),
            ));
        }

        let doc = serde_json::to_string(tourney)?;
        let _: () = redis::pipe()
            .atomic()
            .set(doc_key(&tourney.id), doc)
            .sadd(IDS_KEY, &tourney.id)
            .sadd(status_key(tourney.status), &tourney.id)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Tourney>, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(doc_key(id)).await?;
        Ok(raw.map(|doc| serde_json::from_str(&doc)).transpose()?)
    }

    async fn list(&self) -> Result<Vec<Tourney>, StoreError> {
        let mut conn = self.conn.clone();
        let ids: Vec<String> = conn.smembers(IDS_KEY).await?;
        let mut all = self.load_members(ids).await?;
        all.sort_by_key(|t| t.start_at);
        Ok(all)
    }

    async fn list_by_status(&self, status: TourneyStatus) -> Result<Vec<Tourney>, StoreError> {
        let mut conn = self.conn.clone();
        let ids: Vec<String> = conn.smembers(status_key(status)).await?;
        let mut matching = self.load_members(ids).await?;
        matching.sort_by_key(|t| t.start_at);
        Ok(matching)
    }

    async fn transaction_exists(&self, transaction_id: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.hexists(TX_INDEX_KEY, transaction_id).await?)
    }

    async fn save_if_status(
        &self,
        tourney: &mut Tourney,
        expected: TourneyStatus,
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        tourney.last_modified = now_ms();
        let doc = serde_json::to_string(tourney)?;
        let committed: i32 = self
            .cas
            .key(doc_key(&tourney.id))
            .key(status_key(expected))
            .key(status_key(tourney.status))
            .arg(expected.as_str())
            .arg(doc)
            .arg(tourney.status.as_str())
            .arg(&tourney.id)
            .invoke_async(&mut conn)
            .await?;
        Ok(committed == 1)
    }
}
