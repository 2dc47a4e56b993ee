use crate::config::{QueryConfig, RelationMode};
use crate::error::{decode_failure, store_failure, Result};
use crate::providers::{CommonMark, Gravatar, LabelTable, NoViews, Shortcodes, StoreShortLinker};
use crate::relation::{RelationSource, StoreRelations, TagArticleIndex};
use crate::traits::{
    AvatarResolver, EmojiConverter, LangProps, MarkdownRenderer, ShortLinker, ViewCounter,
};
use domain::{fields, User};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use storage::{Collection, DocumentStore, Filter, Query};
use tracing::info;

/// External services the engine consults while assembling articles.
#[derive(Clone)]
pub struct Collaborators {
    pub labels: Arc<dyn LangProps>,
    pub avatars: Arc<dyn AvatarResolver>,
    pub markdown: Arc<dyn MarkdownRenderer>,
    pub emoji: Arc<dyn EmojiConverter>,
    pub short_links: Arc<dyn ShortLinker>,
    pub views: Arc<dyn ViewCounter>,
}

impl Collaborators {
    pub fn with_defaults(store: Arc<dyn DocumentStore>, config: &QueryConfig) -> anyhow::Result<Self> {
        Ok(Self {
            labels: Arc::new(LabelTable::default()),
            avatars: Arc::new(Gravatar::default()),
            markdown: Arc::new(CommonMark),
            emoji: Arc::new(Shortcodes),
            short_links: Arc::new(StoreShortLinker::new(store, &config.serve_path)?),
            views: Arc::new(NoViews),
        })
    }

    pub fn labels(mut self, labels: Arc<dyn LangProps>) -> Self {
        self.labels = labels;
        self
    }

    pub fn views(mut self, views: Arc<dyn ViewCounter>) -> Self {
        self.views = views;
        self
    }
}

/// Read side of the forum: selection, joining, ranking and rendering of
/// articles. Stateless apart from the collaborators it holds.
#[derive(Clone)]
pub struct ArticleService {
    pub(crate) store: Arc<dyn DocumentStore>,
    pub(crate) relations: Arc<dyn RelationSource>,
    pub(crate) collab: Collaborators,
    pub(crate) config: QueryConfig,
}

/// A decoded page of documents.
pub(crate) struct Found<T> {
    pub items: Vec<T>,
    pub page_count: usize,
    pub record_count: usize,
}

impl ArticleService {
    /// Builds the relation source selected by `config.relation_mode`; the
    /// index mode loads every relation row up front.
    pub async fn new(
        store: Arc<dyn DocumentStore>,
        collab: Collaborators,
        config: QueryConfig,
    ) -> Result<Self> {
        let relations: Arc<dyn RelationSource> = match config.relation_mode {
            RelationMode::Rows => Arc::new(StoreRelations::new(store.clone())),
            RelationMode::Index => {
                let index = TagArticleIndex::load(store.as_ref())
                    .await
                    .map_err(|e| store_failure("Loading tag-article index".to_string(), e))?;
                info!("Tag-article index loaded: {} tags", index.tag_count());
                Arc::new(index)
            }
        };
        Ok(Self::with_relations(store, relations, collab, config))
    }

    pub fn with_relations(
        store: Arc<dyn DocumentStore>,
        relations: Arc<dyn RelationSource>,
        collab: Collaborators,
        config: QueryConfig,
    ) -> Self {
        Self {
            store,
            relations,
            collab,
            config,
        }
    }

    /// Re-reads the relation source; a no-op in rows mode.
    pub async fn refresh_relations(&self) -> Result<()> {
        self.relations
            .refresh(self.store.as_ref())
            .await
            .map_err(|e| store_failure("Refreshing tag-article relations".to_string(), e))
    }

        pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Runs a query and decodes every result. `context` names the operation
    /// and its key parameters for the failure log.
    pub(crate) async fn find<T: DeserializeOwned>(
        &self,
        collection: Collection,
        query: &Query,
        context: impl FnOnce() -> String,
    ) -> Result<Found<T>> {
        let res = self
            .store
            .query(collection, query)
            .await
            .map_err(|e| store_failure(context(), e))?;
        let items = res
            .results
            .into_iter()
            .map(|doc| decode(collection, doc))
            .collect::<Result<Vec<T>>>()?;
        Ok(Found {
            items,
            page_count: res.page_count,
            record_count: res.record_count,
        })
    }

    pub(crate) async fn find_one<T: DeserializeOwned>(
        &self,
        collection: Collection,
        filter: Filter,
        context: impl FnOnce() -> String,
    ) -> Result<Option<T>> {
        let query = Query::new().filter(filter).page(1, 1);
        let found = self.find(collection, &query, context).await?;
        Ok(found.items.into_iter().next())
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        collection: Collection,
        id: &str,
        context: impl FnOnce() -> String,
    ) -> Result<Option<T>> {
        let doc = self
            .store
            .get(collection, id)
            .await
            .map_err(|e| store_failure(context(), e))?;
        doc.map(|doc| decode(collection, doc)).transpose()
    }

    pub async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.find_one(Collection::Users, Filter::eq(fields::user::EMAIL, email), || {
            format!("Gets user [email={}]", email)
        })
        .await
    }

    pub async fn user_by_name(&self, name: &str) -> Result<Option<User>> {
        self.find_one(Collection::Users, Filter::eq(fields::user::NAME, name), || {
            format!("Gets user [name={}]", name)
        })
        .await
    }

    pub async fn user(&self, id: &str) -> Result<Option<User>> {
        self.get(Collection::Users, id, || format!("Gets user [id={}]", id))
            .await
    }
}

pub(crate) fn decode<T: DeserializeOwned>(collection: Collection, doc: Value) -> Result<T> {
    serde_json::from_value(doc).map_err(|e| decode_failure(collection.name(), e))
}
