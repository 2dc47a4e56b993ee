use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::{fs, path::Path};
use tracing::info;

mod memory;
mod models;
mod query;
mod repo;

pub use memory::MemoryStore;
pub use query::{compare_values, Collection, Direction, Filter, Query, QueryResult, Sort};

/// Filter/sort/paginate access to named document collections. The engine
/// only reads through `query`, `get` and `random`; `put` is for the writers
/// that live outside it.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn query(&self, collection: Collection, query: &Query) -> anyhow::Result<QueryResult>;

    async fn get(&self, collection: Collection, id: &str) -> anyhow::Result<Option<Value>>;

    /// Uniform sample of at most `n` documents.
    async fn random(&self, collection: Collection, n: usize) -> anyhow::Result<Vec<Value>>;

    async fn put(&self, collection: Collection, doc: Value) -> anyhow::Result<()>;
}

pub(crate) fn document_id(doc: &Value) -> anyhow::Result<String> {
    doc.get(domain::fields::ID)
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("document has no string id"))
}

#[derive(Clone)]
pub struct Db {
    pub(crate) pool: Pool<Sqlite>,
}

impl Db {
    pub async fn new(db_url: &str) -> anyhow::Result<Self> {
        let in_memory = db_url.contains(":memory:");
        if db_url.starts_with("sqlite://") && !in_memory {
            let path_str = db_url.trim_start_matches("sqlite://");
            let path = Path::new(path_str);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    fs::create_dir_all(parent)?;
                }
            }
        }
        if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            Sqlite::create_database(db_url).await?;
        }
        // 内存库每个连接都是独立的数据库，只能用单连接
        let mut options = SqlitePoolOptions::new();
        if in_memory {
            options = options.max_connections(1);
        }
        let pool = options.connect(db_url).await?;
        sqlx::query("PRAGMA journal_mode = WAL;")
            .execute(&pool)
            .await?;
        sqlx::query("PRAGMA synchronous = NORMAL;")
            .execute(&pool)
            .await?;
        sqlx::migrate!("../../migrations").run(&pool).await?;
        info!("Document store ready: {}", db_url);
        Ok(Self { pool })
    }
}
