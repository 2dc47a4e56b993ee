//! Fixtures shared by the engine's unit tests.

use crate::config::QueryConfig;
use crate::relation::StoreRelations;
use crate::service::{ArticleService, Collaborators};
use crate::traits::ViewCounter;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use storage::{Collection, DocumentStore, MemoryStore, Query, QueryResult};

pub(crate) const NOW: i64 = 1_700_000_000_000;

/// View counter with fixed values.
pub(crate) struct FixedViews(HashMap<String, u32>);

impl ViewCounter for FixedViews {
    fn viewing(&self, article_id: &str) -> Option<u32> {
        self.0.get(article_id).copied()
    }
}

/// Store wrapper that counts reads per collection.
#[derive(Clone, Default)]
pub(crate) struct CountingStore {
    inner: MemoryStore,
    reads: Arc<Mutex<HashMap<Collection, usize>>>,
}

impl CountingStore {
    pub(crate) fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            reads: Arc::default(),
        }
    }

    pub(crate) fn reads(&self, collection: Collection) -> usize {
        self.reads.lock().unwrap().get(&collection).copied().unwrap_or(0)
    }

    fn hit(&self, collection: Collection) {
        *self.reads.lock().unwrap().entry(collection).or_default() += 1;
    }
}

#[async_trait]
impl DocumentStore for CountingStore {
    async fn query(&self, collection: Collection, query: &Query) -> anyhow::Result<QueryResult> {
        self.hit(collection);
        self.inner.query(collection, query).await
    }

    async fn get(&self, collection: Collection, id: &str) -> anyhow::Result<Option<Value>> {
        self.hit(collection);
        self.inner.get(collection, id).await
    }

    async fn random(&self, collection: Collection, n: usize) -> anyhow::Result<Vec<Value>> {
        self.hit(collection);
        self.inner.random(collection, n).await
    }

    async fn put(&self, collection: Collection, doc: Value) -> anyhow::Result<()> {
        self.inner.put(collection, doc).await
    }
}

pub(crate) async fn seed(store: &MemoryStore, collection: Collection, docs: Vec<Value>) {
    for doc in docs {
        store.put(collection, doc).await.unwrap();
    }
}

pub(crate) fn config() -> QueryConfig {
    QueryConfig {
        serve_path: "https://forum.example".to_string(),
        ..Default::default()
    }
}

pub(crate) fn service(store: MemoryStore) -> ArticleService {
    service_with_views(store, &[])
}

pub(crate) fn service_with_views(store: MemoryStore, views: &[(&str, u32)]) -> ArticleService {
    service_over(Arc::new(store), views)
}

pub(crate) fn service_over(store: Arc<dyn DocumentStore>, views: &[(&str, u32)]) -> ArticleService {
    let config = config();
    let views = FixedViews(views.iter().map(|(id, n)| (id.to_string(), *n)).collect());
    let collab = Collaborators::with_defaults(store.clone(), &config)
        .unwrap()
        .views(Arc::new(views));
    ArticleService::with_relations(
        store.clone(),
        Arc::new(StoreRelations::new(store)),
        collab,
        config,
    )
}
