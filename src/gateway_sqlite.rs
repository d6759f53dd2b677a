/*!
SQLite Gateway

Durable [`PersistenceGateway`] implementation backed by a single
`flowcharts` table: one row per flowchart key, holding the serialized node
and edge sets plus a last-modified timestamp. Every save is an upsert that
replaces the whole document.

## Behavior

- Uses the serde persisted shapes from [`crate::gateway`] for encoding;
  this module is database I/O only.
- When the `sqlite-migrations` feature is enabled (default), embedded
  migrations (`sqlx::migrate!("./migrations")`) run on connect; disabling
  the feature assumes external migration orchestration.
- The database URL resolves from `FLOWSYNC_SQLITE_URL` (via dotenvy) with a
  `sqlite://flowsync.db` fallback; the underlying file is created on demand.
*/

use std::sync::Arc;

use sqlx::{Row, SqlitePool};
use tracing::instrument;

use crate::gateway::{GatewayError, PersistedEdge, PersistedFlowchart, PersistedNode, PersistenceGateway};
use crate::model::Snapshot;
use crate::types::FlowchartKey;
use crate::utils::json_ext::JsonSerializable;

/// SQLite-backed gateway holding a shared connection pool.
pub struct SqliteGateway {
    pool: Arc<SqlitePool>,
}

impl std::fmt::Debug for SqliteGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteGateway").finish()
    }
}

impl SqliteGateway {
    /// Connect (or create) a SQLite database at `database_url`.
    /// Example URL: "sqlite://flowsync.db"
    #[must_use = "gateway must be used to persist the flowchart"]
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str) -> Result<Self, GatewayError> {
        let pool = SqlitePool::connect(database_url)
            .await
            .map_err(|e| GatewayError::backend(format!("connect error: {e}")))?;
        #[cfg(feature = "sqlite-migrations")]
        {
            if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
                return Err(GatewayError::backend(format!("migration failure: {e}")));
            }
        }
        #[cfg(not(feature = "sqlite-migrations"))]
        {
            // Feature disabled: schema assumed to be applied externally.
        }
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Connect using the environment-resolved database URL.
    pub async fn from_env() -> Result<Self, GatewayError> {
        let url = Self::resolve_database_url(None);
        Self::ensure_database_file(&url);
        Self::connect(&url).await
    }

    fn resolve_database_url(provided: Option<String>) -> String {
        if let Some(url) = provided {
            return url;
        }
        dotenvy::dotenv().ok();
        std::env::var("FLOWSYNC_SQLITE_URL").unwrap_or_else(|_| "sqlite://flowsync.db".to_string())
    }

    /// Ensure the underlying sqlite file exists. Steps:
    /// 1. Strip the "sqlite://" scheme to get a filesystem path.
    /// 2. Create parent directories if needed.
    /// 3. Attempt to create the file (ignore errors if it already exists).
    fn ensure_database_file(database_url: &str) {
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            let path = path.trim();
            if !path.is_empty() {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    let _ = std::fs::create_dir_all(parent);
                }
                if !p.exists() {
                    let _ = std::fs::File::create_new(p);
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl PersistenceGateway for SqliteGateway {
    #[instrument(skip(self), err)]
    async fn load(&self, key: &FlowchartKey) -> Result<Option<Snapshot>, GatewayError> {
        let row = sqlx::query(
            "SELECT nodes_json, edges_json, updated_at FROM flowcharts WHERE id = ?1",
        )
        .bind(key.as_str())
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| GatewayError::backend(format!("load error: {e}")))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let nodes_json: String = row
            .try_get("nodes_json")
            .map_err(|e| GatewayError::backend(format!("missing nodes_json: {e}")))?;
        let edges_json: String = row
            .try_get("edges_json")
            .map_err(|e| GatewayError::backend(format!("missing edges_json: {e}")))?;
        let updated_at: String = row
            .try_get("updated_at")
            .map_err(|e| GatewayError::backend(format!("missing updated_at: {e}")))?;

        let record = PersistedFlowchart {
            nodes: Vec::<PersistedNode>::from_json_str(&nodes_json)?,
            edges: Vec::<PersistedEdge>::from_json_str(&edges_json)?,
            updated_at,
        };
        Snapshot::try_from(record).map(Some)
    }

    #[instrument(skip(self, snapshot), err)]
    async fn save(&self, key: &FlowchartKey, snapshot: &Snapshot) -> Result<(), GatewayError> {
        let record = PersistedFlowchart::from(snapshot);
        let nodes_json = record.nodes.to_json_string()?;
        let edges_json = record.edges.to_json_string()?;

        sqlx::query(
            "INSERT INTO flowcharts (id, nodes_json, edges_json, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                 nodes_json = excluded.nodes_json,
                 edges_json = excluded.edges_json,
                 updated_at = excluded.updated_at",
        )
        .bind(key.as_str())
        .bind(nodes_json)
        .bind(edges_json)
        .bind(record.updated_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| GatewayError::backend(format!("save error: {e}")))?;
        Ok(())
    }
}
