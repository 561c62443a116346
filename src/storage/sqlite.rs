use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::config::StorageConfig;
use crate::domain::Paise;

use super::{BalanceAdjustment, MIGRATION_001_NODES, Mutation, Store, paths};

/// [`Store`] backed by a single SQLite table of JSON nodes.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new store with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open the database described by `config`.
    /// With `create` set, the database file is created if it doesn't exist.
    pub async fn connect(config: &StorageConfig, create: bool) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(&config.database)
            .create_if_missing(create)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(config.busy_timeout());

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database {}", config.database))?;

        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(MIGRATION_001_NODES)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(config: &StorageConfig) -> Result<Self> {
        let store = Self::connect(config, true).await?;
        store.migrate().await?;
        Ok(store)
    }

    async fn read_node(&self, path: &str) -> Result<Option<Value>> {
        let row = sqlx::query("SELECT value FROM nodes WHERE path = ?")
            .bind(path)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to read node")?;

        row.map(|row| decode(row.get("value"))).transpose()
    }

    async fn read_children(&self, path: &str) -> Result<Option<Value>> {
        let rows = sqlx::query("SELECT path, value FROM nodes WHERE parent = ? ORDER BY path")
            .bind(path)
            .fetch_all(&self.pool)
            .await
            .context("Failed to read children")?;

        if rows.is_empty() {
            return Ok(None);
        }

        let mut children = Map::new();
        for row in &rows {
            let child_path: String = row.get("path");
            let (_, key) = paths::split(&child_path);
            children.insert(key.to_string(), decode(row.get("value"))?);
        }
        Ok(Some(Value::Object(children)))
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn read(&self, path: &str) -> Result<Option<Value>> {
        validate_path(path)?;
        match self.read_node(path).await? {
            Some(value) => Ok(Some(value)),
            None => self.read_children(path).await,
        }
    }

    async fn write(&self, path: &str, value: Value) -> Result<()> {
        let mut conn = self.pool.acquire().await.context("Failed to acquire connection")?;
        apply(&mut conn, &Mutation::set(path, value)).await
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<()> {
        let mut conn = self.pool.acquire().await.context("Failed to acquire connection")?;
        apply(&mut conn, &Mutation::merge(path, fields)).await
    }

    async fn commit(&self, mutations: Vec<Mutation>) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        for mutation in &mutations {
            apply(&mut tx, mutation).await?;
        }
        tx.commit().await.context("Failed to commit")?;
        tracing::debug!(count = mutations.len(), "committed mutations");
        Ok(())
    }

    async fn insert_unique(&self, path: &str, field: &str, item: &str) -> Result<bool> {
        validate_path(path)?;
        if !paths::is_valid_key(field) {
            bail!("invalid field name {field:?}");
        }

        // Membership test and append in one statement, so concurrent inserts
        // of different items cannot overwrite each other.
        let result = sqlx::query(
            r#"
            UPDATE nodes
            SET value = json_set(value, ?1,
                    json_insert(COALESCE(json_extract(value, ?1), json_array()), '$[#]', ?2)),
                updated_at = ?3
            WHERE path = ?4
              AND NOT EXISTS (
                  SELECT 1 FROM json_each(nodes.value, ?1) WHERE json_each.value = ?2
              )
            "#,
        )
        .bind(format!("$.{field}"))
        .bind(item)
        .bind(Utc::now().to_rfc3339())
        .bind(path)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to insert into {field} of {path}"))?;

        Ok(result.rows_affected() == 1)
    }

    async fn adjust_balance(
        &self,
        uid: &str,
        delta: Paise,
        mutations: Vec<Mutation>,
    ) -> Result<BalanceAdjustment> {
        let profile_path = paths::profile(uid);
        validate_path(&profile_path)?;

        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        // Check and write in one statement so concurrent adjustments serialize
        // on the write lock instead of racing a separate read. SQLite turns an
        // overflowing integer sum into REAL, hence the typeof guard.
        let row = sqlx::query(
            r#"
            UPDATE nodes
            SET value = json_set(value, '$.walletBalance',
                    COALESCE(json_extract(value, '$.walletBalance'), 0) + ?1),
                updated_at = ?2
            WHERE path = ?3
              AND COALESCE(json_extract(value, '$.walletBalance'), 0) + ?1 >= 0
              AND typeof(COALESCE(json_extract(value, '$.walletBalance'), 0) + ?1) = 'integer'
            RETURNING json_extract(value, '$.walletBalance') AS balance
            "#,
        )
        .bind(delta)
        .bind(Utc::now().to_rfc3339())
        .bind(&profile_path)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to adjust balance")?;

        let Some(row) = row else {
            let current = sqlx::query(
                "SELECT COALESCE(json_extract(value, '$.walletBalance'), 0) AS balance FROM nodes WHERE path = ?",
            )
            .bind(&profile_path)
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to read balance")?;
            tx.rollback().await.context("Failed to roll back")?;

            let Some(row) = current else {
                return Ok(BalanceAdjustment::ProfileMissing);
            };
            let balance: Paise = row.try_get("balance").context("Invalid stored balance")?;
            return Ok(if balance.checked_add(delta).is_none() {
                BalanceAdjustment::Overflow { balance }
            } else {
                BalanceAdjustment::Insufficient { balance }
            });
        };

        let new_balance: Paise = row.try_get("balance").context("Invalid stored balance")?;
        for mutation in &mutations {
            apply(&mut tx, mutation).await?;
        }
        tx.commit().await.context("Failed to commit balance adjustment")?;

        Ok(BalanceAdjustment::Applied { new_balance })
    }
}

async fn apply(conn: &mut SqliteConnection, mutation: &Mutation) -> Result<()> {
    validate_path(mutation.path())?;
    let now = Utc::now().to_rfc3339();

    match mutation {
        Mutation::Set { path, value } if value.is_null() => {
            sqlx::query(
                "DELETE FROM nodes WHERE path = ?1 OR substr(path, 1, length(?1) + 1) = ?1 || '/'",
            )
            .bind(path)
            .execute(&mut *conn)
            .await
            .with_context(|| format!("Failed to remove {path}"))?;
        }
        Mutation::Set { path, value } => {
            let (parent, _) = paths::split(path);
            sqlx::query(
                r#"
                INSERT INTO nodes (path, parent, value, updated_at)
                VALUES (?, ?, ?, ?)
                ON CONFLICT (path) DO UPDATE
                SET value = excluded.value, updated_at = excluded.updated_at
                "#,
            )
            .bind(path)
            .bind(parent)
            .bind(serde_json::to_string(value)?)
            .bind(&now)
            .execute(&mut *conn)
            .await
            .with_context(|| format!("Failed to write {path}"))?;
        }
        Mutation::Merge { path, fields } => {
            let (parent, _) = paths::split(path);
            sqlx::query(
                r#"
                INSERT INTO nodes (path, parent, value, updated_at)
                VALUES (?1, ?2, json_patch('{}', ?3), ?4)
                ON CONFLICT (path) DO UPDATE
                SET value = json_patch(nodes.value, ?3), updated_at = ?4
                "#,
            )
            .bind(path)
            .bind(parent)
            .bind(serde_json::to_string(fields)?)
            .bind(&now)
            .execute(&mut *conn)
            .await
            .with_context(|| format!("Failed to update {path}"))?;
        }
        Mutation::Increment { path, field, delta } => {
            if !paths::is_valid_key(field) {
                bail!("invalid field name {field:?}");
            }
            let result = sqlx::query(
                r#"
                UPDATE nodes
                SET value = json_set(value, ?1, COALESCE(json_extract(value, ?1), 0) + ?2),
                    updated_at = ?3
                WHERE path = ?4
                  AND typeof(COALESCE(json_extract(value, ?1), 0) + ?2) = 'integer'
                "#,
            )
            .bind(format!("$.{field}"))
            .bind(delta)
            .bind(&now)
            .bind(path)
            .execute(&mut *conn)
            .await
            .with_context(|| format!("Failed to increment {path}"))?;

            if result.rows_affected() == 0 {
                bail!("cannot increment {field} of {path}: node missing or sum overflows");
            }
        }
    }
    Ok(())
}

fn decode(raw: String) -> Result<Value> {
    serde_json::from_str(&raw).context("Stored node is not valid JSON")
}

fn validate_path(path: &str) -> Result<()> {
    if !path.split('/').all(paths::is_valid_key) {
        bail!("invalid path {path:?}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::storage::children_of;

    async fn test_store() -> (SqliteStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let config = StorageConfig::with_database(dir.path().join("test.db").to_string_lossy());
        let store = SqliteStore::init(&config).await.unwrap();
        (store, dir)
    }

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_read_absent() {
        let (store, _dir) = test_store().await;
        assert_eq!(store.read("users/u1/profile").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let (store, _dir) = test_store().await;
        store
            .write("users/u1/profile", json!({ "name": "Asha" }))
            .await
            .unwrap();

        let value = store.read("users/u1/profile").await.unwrap();
        assert_eq!(value, Some(json!({ "name": "Asha" })));
    }

    #[tokio::test]
    async fn test_read_collection_assembles_children() {
        let (store, _dir) = test_store().await;
        let first = store.append_child("users/u1/goals");
        let second = store.append_child("users/u1/goals");
        assert_ne!(first, second);

        store.write(&first, json!({ "n": 1 })).await.unwrap();
        store.write(&second, json!({ "n": 2 })).await.unwrap();

        let items: Vec<Value> = children_of(store.read("users/u1/goals").await.unwrap()).unwrap();
        assert_eq!(items, vec![json!({ "n": 1 }), json!({ "n": 2 })]);
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let (store, _dir) = test_store().await;
        store
            .write("users/u1/profile", json!({ "name": "Asha", "riskLevel": "Low" }))
            .await
            .unwrap();
        store
            .update("users/u1/profile", fields(json!({ "riskLevel": "High" })))
            .await
            .unwrap();

        let value = store.read("users/u1/profile").await.unwrap().unwrap();
        assert_eq!(value, json!({ "name": "Asha", "riskLevel": "High" }));
    }

    #[tokio::test]
    async fn test_update_creates_missing_node() {
        let (store, _dir) = test_store().await;
        store
            .update("faqs/q1", fields(json!({ "question": "?", "gone": null })))
            .await
            .unwrap();
        assert_eq!(
            store.read("faqs/q1").await.unwrap(),
            Some(json!({ "question": "?" }))
        );
    }

    #[tokio::test]
    async fn test_write_null_removes_subtree() {
        let (store, _dir) = test_store().await;
        store.write("sessions/abc", json!({ "uid": "u1" })).await.unwrap();
        store.write("sessions/abcd", json!({ "uid": "u2" })).await.unwrap();

        store.write("sessions/abc", Value::Null).await.unwrap();

        assert_eq!(store.read("sessions/abc").await.unwrap(), None);
        assert!(store.read("sessions/abcd").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_commit_is_all_or_nothing() {
        let (store, _dir) = test_store().await;
        let result = store
            .commit(vec![
                Mutation::set("lessons/l1", json!({ "title": "One" })),
                Mutation::increment("lessons/missing", "views", 1),
            ])
            .await;

        assert!(result.is_err());
        assert_eq!(store.read("lessons/l1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_adjust_balance_outcomes() {
        let (store, _dir) = test_store().await;
        assert_eq!(
            store.adjust_balance("u1", 100, vec![]).await.unwrap(),
            BalanceAdjustment::ProfileMissing
        );

        store
            .write("users/u1/profile", json!({ "walletBalance": 500 }))
            .await
            .unwrap();

        let applied = store
            .adjust_balance(
                "u1",
                -200,
                vec![Mutation::set("users/u1/transactions/t1", json!({ "amount": 200 }))],
            )
            .await
            .unwrap();
        assert_eq!(applied, BalanceAdjustment::Applied { new_balance: 300 });
        assert!(store.read("users/u1/transactions/t1").await.unwrap().is_some());

        let refused = store
            .adjust_balance(
                "u1",
                -301,
                vec![Mutation::set("users/u1/transactions/t2", json!({ "amount": 301 }))],
            )
            .await
            .unwrap();
        assert_eq!(refused, BalanceAdjustment::Insufficient { balance: 300 });
        assert_eq!(store.read("users/u1/transactions/t2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_adjust_balance_refuses_overflow() {
        let (store, _dir) = test_store().await;
        store
            .write("users/u1/profile", json!({ "walletBalance": i64::MAX - 10 }))
            .await
            .unwrap();

        let refused = store
            .adjust_balance(
                "u1",
                11,
                vec![Mutation::set("users/u1/transactions/t1", json!({ "amount": 11 }))],
            )
            .await
            .unwrap();
        assert_eq!(refused, BalanceAdjustment::Overflow { balance: i64::MAX - 10 });
        assert_eq!(store.read("users/u1/transactions/t1").await.unwrap(), None);

        let applied = store.adjust_balance("u1", 10, vec![]).await.unwrap();
        assert_eq!(applied, BalanceAdjustment::Applied { new_balance: i64::MAX });

        let profile = store.read("users/u1/profile").await.unwrap().unwrap();
        assert_eq!(profile["walletBalance"], i64::MAX);
    }

    #[tokio::test]
    async fn test_adjust_balance_rolls_back_on_failed_mutation() {
        let (store, _dir) = test_store().await;
        store
            .write("users/u1/profile", json!({ "walletBalance": 500 }))
            .await
            .unwrap();

        let result = store
            .adjust_balance(
                "u1",
                -100,
                vec![Mutation::increment("users/u1/goals/nope", "currentAmount", 100)],
            )
            .await;
        assert!(result.is_err());

        let profile = store.read("users/u1/profile").await.unwrap().unwrap();
        assert_eq!(profile["walletBalance"], 500);
    }

    #[tokio::test]
    async fn test_insert_unique() {
        let (store, _dir) = test_store().await;
        assert!(!store.insert_unique("users/u1/profile", "tags", "a").await.unwrap());

        store
            .write("users/u1/profile", json!({ "name": "Asha" }))
            .await
            .unwrap();
        assert!(store.insert_unique("users/u1/profile", "tags", "a").await.unwrap());
        assert!(store.insert_unique("users/u1/profile", "tags", "b").await.unwrap());
        assert!(!store.insert_unique("users/u1/profile", "tags", "a").await.unwrap());

        let profile = store.read("users/u1/profile").await.unwrap().unwrap();
        assert_eq!(profile, json!({ "name": "Asha", "tags": ["a", "b"] }));

        assert!(store.insert_unique("users/u1/profile", "a.b", "x").await.is_err());
    }

    #[tokio::test]
    async fn test_increment_refuses_overflow() {
        let (store, _dir) = test_store().await;
        store
            .write("users/u1/goals/g1", json!({ "currentAmount": i64::MAX }))
            .await
            .unwrap();

        let result = store
            .commit(vec![Mutation::increment("users/u1/goals/g1", "currentAmount", 1)])
            .await;
        assert!(result.is_err());

        let goal = store.read("users/u1/goals/g1").await.unwrap().unwrap();
        assert_eq!(goal["currentAmount"], i64::MAX);
    }

    #[tokio::test]
    async fn test_rejects_invalid_paths() {
        let (store, _dir) = test_store().await;
        assert!(store.read("users//profile").await.is_err());
        assert!(store.write("users/a.b", json!(1)).await.is_err());
    }
}
