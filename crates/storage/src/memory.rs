use crate::query::{Collection, Query, QueryResult};
use crate::DocumentStore;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rand::seq::IteratorRandom;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

type Documents = BTreeMap<String, Value>;

/// In-process document store. Cheap to clone; clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<Collection, Documents>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn run(&self, collection: Collection, query: &Query) -> Result<QueryResult> {
        let guard = self
            .inner
            .read()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;

        let mut matched: Vec<&Value> = guard
            .get(&collection)
            .map(|docs| {
                docs.values()
                    .filter(|doc| query.filter.as_ref().map_or(true, |f| f.matches(doc)))
                    .collect()
            })
            .unwrap_or_default();

        matched.sort_by(|a, b| query.compare(a, b));

        let record_count = matched.len();
        let take = query.page_size.unwrap_or(usize::MAX);
        let results = matched
            .into_iter()
            .skip(query.offset())
            .take(take)
            .map(|doc| query.apply_projection(doc.clone()))
            .collect();

        Ok(QueryResult {
            results,
            page_count: query.page_count(record_count),
            record_count,
        })
    }

    fn sample(&self, collection: Collection, n: usize) -> Result<Vec<Value>> {
        let guard = self
            .inner
            .read()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        let Some(docs) = guard.get(&collection) else {
            return Ok(Vec::new());
        };
        let mut rng = rand::thread_rng();
        Ok(docs.values().cloned().choose_multiple(&mut rng, n))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn query(&self, collection: Collection, query: &Query) -> Result<QueryResult> {
        self.run(collection, query)
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>> {
        let guard = self
            .inner
            .read()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        Ok(guard.get(&collection).and_then(|docs| docs.get(id)).cloned())
    }

    async fn random(&self, collection: Collection, n: usize) -> Result<Vec<Value>> {
        self.sample(collection, n)
    }

    async fn put(&self, collection: Collection, doc: Value) -> Result<()> {
        let id = crate::document_id(&doc)?;
        let mut guard = self
            .inner
            .write()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        guard.entry(collection).or_default().insert(id, doc);
        Ok(())
    }
}
