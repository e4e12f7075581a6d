use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::model::{ComponentKind, MetricKind};
use crate::scoring::ComponentScore;
use crate::util::{ensure_directory, now_utc_string};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScoreKey {
    pub scope: String,
    pub metric: MetricKind,
    pub component: ComponentKind,
    /// Metadata field name, or the component name for whole-component scores.
    pub target: String,
}

impl ScoreKey {
    pub fn new(
        scope: &str,
        metric: MetricKind,
        component: ComponentKind,
        target: impl Into<String>,
    ) -> Self {
        Self {
            scope: scope.trim().to_string(),
            metric,
            component,
            target: target.into(),
        }
    }

    pub fn for_component(scope: &str, metric: MetricKind, component: ComponentKind) -> Self {
        Self::new(scope, metric, component, component.as_str())
    }

    pub fn storage_key(&self) -> String {
        format!(
            "{}:{}.{}.{}",
            self.scope,
            self.metric.as_str(),
            self.component.as_str(),
            self.target
        )
    }
}

/// Key-value store holding per-field combiner outputs. A missing key is
/// reported as `Ok(None)`.
pub trait ScoreStore {
    fn get(&self, key: &ScoreKey) -> Result<Option<ComponentScore>>;
    fn put(&mut self, key: &ScoreKey, score: &ComponentScore) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryScoreStore {
    entries: HashMap<String, ComponentScore>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreStore for MemoryScoreStore {
    fn get(&self, key: &ScoreKey) -> Result<Option<ComponentScore>> {
        Ok(self.entries.get(&key.storage_key()).copied())
    }

    fn put(&mut self, key: &ScoreKey, score: &ComponentScore) -> Result<()> {
        self.entries.insert(key.storage_key(), *score);
        Ok(())
    }
}

pub struct SqliteScoreStore {
    connection: Connection,
}

impl SqliteScoreStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                ensure_directory(parent)?;
            }
        }
        let connection = Connection::open(path)
            .with_context(|| format!("failed to open score store: {}", path.display()))?;
        Self::from_connection(connection)
    }

    pub fn open_in_memory() -> Result<Self> {
        let connection =
            Connection::open_in_memory().context("failed to open in-memory score store")?;
        Self::from_connection(connection)
    }

    fn from_connection(connection: Connection) -> Result<Self> {
        connection
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS score_store (
                  key TEXT PRIMARY KEY,
                  payload TEXT NOT NULL,
                  updated_at TEXT NOT NULL
                );
                ",
            )
            .context("failed to create score_store table")?;
        Ok(Self { connection })
    }

    pub fn len(&self) -> Result<usize> {
        let count: i64 = self
            .connection
            .query_row("SELECT COUNT(*) FROM score_store", [], |row| row.get(0))
            .context("failed to count score_store rows")?;
        Ok(count as usize)
    }
}

impl ScoreStore for SqliteScoreStore {
    fn get(&self, key: &ScoreKey) -> Result<Option<ComponentScore>> {
        let storage_key = key.storage_key();
        let payload = self
            .connection
            .query_row(
                "SELECT payload FROM score_store WHERE key = ?1",
                params![storage_key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .with_context(|| format!("failed to read score_store key {storage_key}"))?;

        let Some(payload) = payload else {
            return Ok(None);
        };
        let score = serde_json::from_str::<ComponentScore>(&payload)
            .with_context(|| format!("failed to parse stored score for {storage_key}"))?;
        Ok(Some(score))
    }

    fn put(&mut self, key: &ScoreKey, score: &ComponentScore) -> Result<()> {
        let storage_key = key.storage_key();
        let payload = serde_json::to_string(score).context("failed to serialize score")?;
        self.connection
            .execute(
                "
                INSERT INTO score_store (key, payload, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET
                  payload = excluded.payload,
                  updated_at = excluded.updated_at
                ",
                params![storage_key, payload, now_utc_string()],
            )
            .with_context(|| format!("failed to write score_store key {storage_key}"))?;
        debug!(key = %storage_key, "stored component score");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryScoreStore, ScoreKey, ScoreStore, SqliteScoreStore};
    use crate::config::ScoringConfig;
    use crate::model::{ComponentKind, MetricKind};
    use crate::scoring::combine_scores;

    #[test]
    fn storage_key_joins_scope_metric_component_and_target() {
        let key = ScoreKey::new("tok-1", MetricKind::Accuracy, ComponentKind::Metadata, "title");
        assert_eq!(key.storage_key(), "tok-1:accuracy.metadata.title");

        let component = ScoreKey::for_component("tok-1", MetricKind::Overall, ComponentKind::Content);
        assert_eq!(component.storage_key(), "tok-1:overall.content.content");
    }

    #[test]
    fn memory_store_treats_missing_keys_as_no_data() {
        let mut store = MemoryScoreStore::new();
        let key = ScoreKey::for_component("p", MetricKind::Overall, ComponentKind::Template);
        assert!(store.get(&key).expect("get succeeds").is_none());

        let score = combine_scores(0.7, 4.0, 1.0, &ScoringConfig::default()).expect("combine");
        store.put(&key, &score).expect("put succeeds");
        assert_eq!(store.get(&key).expect("get succeeds"), Some(score));
    }

    #[test]
    fn sqlite_store_upserts_and_reads_back() {
        let mut store = SqliteScoreStore::open_in_memory().expect("store opens");
        let key = ScoreKey::new("p", MetricKind::Overall, ComponentKind::Metadata, "doi");
        assert!(store.get(&key).expect("get succeeds").is_none());

        let config = ScoringConfig::default();
        let first = combine_scores(0.2, 2.0, 1.0, &config).expect("combine");
        let second = combine_scores(0.9, 5.0, 1.2, &config).expect("combine");
        store.put(&key, &first).expect("first put");
        store.put(&key, &second).expect("second put");

        assert_eq!(store.len().expect("count"), 1);
        assert_eq!(store.get(&key).expect("get succeeds"), Some(second));
    }

    #[test]
    fn sqlite_store_persists_across_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("scores.sqlite");
        let key = ScoreKey::for_component("p", MetricKind::Quality, ComponentKind::ResearchField);
        let score = combine_scores(0.5, 3.0, 1.0, &ScoringConfig::default()).expect("combine");

        {
            let mut store = SqliteScoreStore::open(&path).expect("store opens");
            store.put(&key, &score).expect("put succeeds");
        }

        let reopened = SqliteScoreStore::open(&path).expect("store reopens");
        assert_eq!(reopened.get(&key).expect("get succeeds"), Some(score));
    }
}
