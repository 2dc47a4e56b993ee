//! Tag ↔ article join over the relation collection.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use domain::{fields, TagArticle};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, RwLock};
use storage::{Collection, DocumentStore, Filter, Query};

/// Resolves tag ids to article ids.
#[async_trait]
pub trait RelationSource: Send + Sync {
    /// Article ids for one page of the given tags, newest first. Ids already
    /// in `fetched` are skipped and every returned id is added to it.
    async fn article_ids(
        &self,
        tag_ids: &[String],
        page: usize,
        page_size: usize,
        fetched: &mut HashSet<String>,
    ) -> Result<Vec<String>>;

    /// Re-reads whatever the source keeps in memory. Sources that read
    /// through to the store have nothing to do.
    async fn refresh(&self, _store: &dyn DocumentStore) -> Result<()> {
        Ok(())
    }
}

/// Pages over the raw relation rows on every call.
///
/// One article holding several of the requested tags occupies several rows,
/// so a page of `page_size` rows may yield fewer distinct articles.
pub struct StoreRelations {
    store: Arc<dyn DocumentStore>,
}

impl StoreRelations {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RelationSource for StoreRelations {
    async fn article_ids(
        &self,
        tag_ids: &[String],
        page: usize,
        page_size: usize,
        fetched: &mut HashSet<String>,
    ) -> Result<Vec<String>> {
        if tag_ids.is_empty() || page_size == 0 {
            return Ok(Vec::new());
        }
        let filter = Filter::any(
            tag_ids
                .iter()
                .map(|id| Filter::eq(fields::tag_article::TAG_ID, id.as_str()))
                .collect(),
        );
        let query = Query::new()
            .filter(filter)
            .desc(fields::ID)
            .page(page, page_size)
            .project(&[fields::ID, fields::tag_article::ARTICLE_ID]);

        let res = self.store.query(Collection::TagArticles, &query).await?;
        let mut ids = Vec::with_capacity(res.results.len());
        for doc in res.results {
            let row: TagArticle = serde_json::from_value(doc)?;
            if row.article_id.is_empty() {
                continue;
            }
            if fetched.insert(row.article_id.clone()) {
                ids.push(row.article_id);
            }
        }
        Ok(ids)
    }
}

/// Materialized `tag id → article ids` index. Pages over distinct article
/// ids, so a full page is returned whenever enough articles exist.
///
/// It is a snapshot: rows written to the store later show up only after
/// `insert` or a `reload`.
#[derive(Default)]
pub struct TagArticleIndex {
    tags: RwLock<HashMap<String, BTreeSet<String>>>,
}

impl TagArticleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: impl IntoIterator<Item = TagArticle>) -> Self {
        Self {
            tags: RwLock::new(group(rows)),
        }
    }

    pub async fn load(store: &dyn DocumentStore) -> Result<Self> {
        Ok(Self::from_rows(read_rows(store).await?))
    }

    /// Replaces the whole index with the store's current rows. Returns the
    /// number of tags indexed.
    pub async fn reload(&self, store: &dyn DocumentStore) -> Result<usize> {
        let fresh = group(read_rows(store).await?);
        let count = fresh.len();
        let mut tags = self.tags.write().map_err(|_| anyhow!("relation index lock poisoned"))?;
        *tags = fresh;
        Ok(count)
    }

    pub fn insert(&self, tag_id: &str, article_id: &str) -> Result<()> {
        let mut tags = self.tags.write().map_err(|_| anyhow!("relation index lock poisoned"))?;
        tags.entry(tag_id.to_string())
            .or_default()
            .insert(article_id.to_string());
        Ok(())
    }

    pub fn remove(&self, tag_id: &str, article_id: &str) -> Result<()> {
        let mut tags = self.tags.write().map_err(|_| anyhow!("relation index lock poisoned"))?;
        if let Some(ids) = tags.get_mut(tag_id) {
            ids.remove(article_id);
            if ids.is_empty() {
                tags.remove(tag_id);
            }
        }
        Ok(())
    }

    pub fn tag_count(&self) -> usize {
        self.tags.read().map(|tags| tags.len()).unwrap_or(0)
    }
}

fn group(rows: impl IntoIterator<Item = TagArticle>) -> HashMap<String, BTreeSet<String>> {
    let mut tags: HashMap<String, BTreeSet<String>> = HashMap::new();
    for row in rows {
        if row.article_id.is_empty() {
            continue;
        }
        tags.entry(row.tag_id).or_default().insert(row.article_id);
    }
    tags
}

async fn read_rows(store: &dyn DocumentStore) -> Result<Vec<TagArticle>> {
    let res = store
        .query(Collection::TagArticles, &Query::new())
        .await?;
    let rows = res
        .results
        .into_iter()
        .map(serde_json::from_value::<TagArticle>)
        .collect::<serde_json::Result<Vec<_>>>()?;
    Ok(rows)
}

#[async_trait]
impl RelationSource for TagArticleIndex {
    async fn article_ids(
        &self,
        tag_ids: &[String],
        page: usize,
        page_size: usize,
        fetched: &mut HashSet<String>,
    ) -> Result<Vec<String>> {
        let tags = self.tags.read().map_err(|_| anyhow!("relation index lock poisoned"))?;
        let merged: BTreeSet<&String> = tag_ids
            .iter()
            .filter_map(|id| tags.get(id))
            .flatten()
            .collect();

        let ids: Vec<String> = merged
            .into_iter()
            .rev()
            .filter(|id| !fetched.contains(*id))
            .skip(page.saturating_sub(1).saturating_mul(page_size))
            .take(page_size)
            .cloned()
            .collect();
        fetched.extend(ids.iter().cloned());
        Ok(ids)
    }

    async fn refresh(&self, store: &dyn DocumentStore) -> Result<()> {
        self.reload(store).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use storage::MemoryStore;

    fn rows() -> Vec<TagArticle> {
        // 文章 3 同时挂在两个标签下
        [("1", "t1", "a1"), ("2", "t1", "a3"), ("3", "t2", "a3"), ("4", "t2", "a2"), ("5", "t2", "a4")]
            .into_iter()
            .map(|(id, tag, article)| TagArticle {
                id: id.to_string(),
                tag_id: tag.to_string(),
                article_id: article.to_string(),
            })
            .collect()
    }

    async fn store() -> Arc<dyn DocumentStore> {
        let store = MemoryStore::new();
        for row in rows() {
            store
                .put(Collection::TagArticles, serde_json::to_value(row).unwrap())
                .await
                .unwrap();
        }
        Arc::new(store)
    }

    fn tags(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn row_pages_may_hold_fewer_distinct_articles() {
        let relations = StoreRelations::new(store().await);
        let mut fetched = HashSet::new();
        // 行按 id 倒序: 5(a4) 4(a2) 3(a3) 2(a3) 1(a1)
        let page = relations
            .article_ids(&tags(&["t1", "t2"]), 2, 2, &mut fetched)
            .await
            .unwrap();
        assert_eq!(page, vec!["a3"]);
        assert_eq!(fetched.len(), 1);
    }

    #[tokio::test]
    async fn rows_skip_already_fetched() {
        let relations = StoreRelations::new(store().await);
        let mut fetched: HashSet<String> = ["a4".to_string()].into();
        let page = relations
            .article_ids(&tags(&["t2"]), 1, 10, &mut fetched)
            .await
            .unwrap();
        assert_eq!(page, vec!["a2", "a3"]);
        assert!(fetched.contains("a2") && fetched.contains("a3"));
    }

    #[tokio::test]
    async fn index_pages_over_distinct_articles() {
        let index = TagArticleIndex::load(store().await.as_ref()).await.unwrap();
        assert_eq!(index.tag_count(), 2);

        let mut fetched = HashSet::new();
        let first = index
            .article_ids(&tags(&["t1", "t2"]), 1, 2, &mut fetched)
            .await
            .unwrap();
        let mut fetched = HashSet::new();
        let second = index
            .article_ids(&tags(&["t1", "t2"]), 2, 2, &mut fetched)
            .await
            .unwrap();
        assert_eq!(first, vec!["a4", "a3"]);
        assert_eq!(second, vec!["a2", "a1"]);
    }

    #[tokio::test]
    async fn index_tracks_inserts_and_removes() {
        let index = TagArticleIndex::from_rows(rows());
        index.insert("t3", "a9").unwrap();
        index.remove("t1", "a1").unwrap();
        index.remove("t1", "a3").unwrap();
        assert_eq!(index.tag_count(), 2);

        let mut fetched = HashSet::new();
        let ids = index
            .article_ids(&tags(&["t1", "t3", "missing"]), 1, 10, &mut fetched)
            .await
            .unwrap();
        assert_eq!(ids, vec!["a9"]);
    }

    #[tokio::test]
    async fn rows_without_article_id_are_ignored() {
        let store = MemoryStore::new();
        store
            .put(Collection::TagArticles, json!({ "id": "1", "tag_id": "t1" }))
            .await
            .unwrap();
        let relations = StoreRelations::new(Arc::new(store));
        let mut fetched = HashSet::new();
        let ids = relations
            .article_ids(&tags(&["t1"]), 1, 5, &mut fetched)
            .await
            .unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn huge_pages_are_empty() {
        let index = TagArticleIndex::from_rows(rows());
        let mut fetched = HashSet::new();
        let ids = index
            .article_ids(&tags(&["t1", "t2"]), usize::MAX, 2, &mut fetched)
            .await
            .unwrap();
        assert!(ids.is_empty());

        let relations = StoreRelations::new(store().await);
        let ids = relations
            .article_ids(&tags(&["t1", "t2"]), usize::MAX, 2, &mut fetched)
            .await
            .unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn reload_picks_up_rows_written_later() {
        let store = store().await;
        let index = TagArticleIndex::load(store.as_ref()).await.unwrap();
        store
            .put(
                Collection::TagArticles,
                json!({ "id": "6", "tag_id": "t3", "article_id": "a9" }),
            )
            .await
            .unwrap();

        let mut fetched = HashSet::new();
        let before = index
            .article_ids(&tags(&["t3"]), 1, 10, &mut fetched)
            .await
            .unwrap();
        assert!(before.is_empty());

        index.refresh(store.as_ref()).await.unwrap();
        assert_eq!(index.tag_count(), 3);
        let after = index
            .article_ids(&tags(&["t3"]), 1, 10, &mut fetched)
            .await
            .unwrap();
        assert_eq!(after, vec!["a9"]);
    }
}
