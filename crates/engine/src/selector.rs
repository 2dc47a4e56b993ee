use crate::assembly::AssembledArticle;
use crate::error::{store_failure, Result};
use crate::providers::labels;
use crate::service::ArticleService;
use chrono::Utc;
use domain::time::days_to_millis;
use domain::{fields, Article, ArticleStatus, ArticleType, Pagination, Tag};
use serde::Serialize;
use std::collections::HashSet;
use storage::{Collection, Filter, Query};
use tracing::warn;

/// Valid, non-discussion articles.
fn showing_filter() -> Filter {
    Filter::all(vec![
        Filter::eq(fields::article::STATUS, ArticleStatus::Valid.as_str()),
        Filter::ne(fields::article::TYPE, ArticleType::Discussion.as_str()),
    ])
}

pub(crate) fn recent_query(page: usize, size: usize) -> Query {
    Query::new()
        .filter(showing_filter())
        .desc(fields::ID)
        .page(page, size)
}

pub(crate) fn top_query(page: usize, size: usize) -> Query {
    Query::new()
        .filter(showing_filter())
        .desc(fields::article::REDDIT_SCORE)
        .desc(fields::article::LATEST_CMT_TIME)
        .desc(fields::ID)
        .page(page, size)
}

/// Admin listing request. `id` narrows the listing to a single article.
#[derive(Debug, Clone, Default)]
pub struct ArticleListRequest {
    pub page: usize,
    pub page_size: usize,
    pub window_size: usize,
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArticleListing {
    pub articles: Vec<AssembledArticle>,
    pub pagination: Pagination,
}

impl ArticleService {
    pub async fn recent_articles(&self, page: usize, size: usize) -> Result<Vec<AssembledArticle>> {
        let found = self
            .find::<Article>(Collection::Articles, &recent_query(page, size), || {
                format!("Gets recent articles [page={}, size={}]", page, size)
            })
            .await?;
        let mut articles = self.organize_articles(found.items).await?;
        self.block_invalid_authors(&mut articles).await?;
        self.attach_participants(&mut articles, self.config.latest_article_participants)
            .await?;
        Ok(articles)
    }

    /// Number of articles the recent listing pages over.
    pub async fn recent_article_count(&self) -> Result<usize> {
        let query = Query::new()
            .filter(showing_filter())
            .page(1, 1)
            .project(&[fields::ID]);
        let found = self
            .find::<Article>(Collection::Articles, &query, || "Counts recent articles".to_string())
            .await?;
        Ok(found.record_count)
    }

    pub async fn hot_articles(&self, size: usize) -> Result<Vec<AssembledArticle>> {
        self.hot_articles_at(Utc::now().timestamp_millis(), size).await
    }

    /// Most commented articles created within the hot window before `now`.
    /// Ids are creation millis, so the window is a lower bound on the id.
    pub(crate) async fn hot_articles_at(&self, now: i64, size: usize) -> Result<Vec<AssembledArticle>> {
        let lower_id = now
            .saturating_sub(days_to_millis(self.config.hot_window_days))
            .to_string();
        let query = Query::new()
            .filter(Filter::all(vec![
                Filter::ge(fields::ID, lower_id.as_str()),
                Filter::ne(fields::article::TYPE, ArticleType::Discussion.as_str()),
            ]))
            .desc(fields::article::COMMENT_CNT)
            .asc(fields::ID)
            .page(1, size);
        let found = self
            .find::<Article>(Collection::Articles, &query, || {
                format!("Gets hot articles [since={}, size={}]", lower_id, size)
            })
            .await?;
        self.organize_articles(found.items).await
    }

    /// First page of the top listing, as shown on the index page.
    pub async fn index_articles(&self, size: usize) -> Result<Vec<AssembledArticle>> {
        self.top_articles(1, size).await
    }

    pub async fn top_articles(&self, page: usize, size: usize) -> Result<Vec<AssembledArticle>> {
        let found = self
            .find::<Article>(Collection::Articles, &top_query(page, size), || {
                format!("Gets top articles [page={}, size={}]", page, size)
            })
            .await?;
        let mut articles = self.organize_articles(found.items).await?;
        self.block_invalid_authors(&mut articles).await?;
        self.attach_participants(&mut articles, self.config.index_article_participants)
            .await?;
        Ok(articles)
    }

    pub async fn tag_by_title(&self, title: &str) -> Result<Option<Tag>> {
        self.find_one(Collection::Tags, Filter::eq(fields::tag::TITLE, title), || {
            format!("Gets tag [title={}]", title)
        })
        .await
    }

    pub async fn articles_by_tag(&self, tag: &Tag, page: usize, size: usize) -> Result<Vec<AssembledArticle>> {
        self.articles_by_tags(page, size, std::slice::from_ref(tag), &[])
            .await
    }

    /// Articles holding any of `tags`, newest first. `projection` limits the
    /// article fields fetched; empty means all.
    pub async fn articles_by_tags(
        &self,
        page: usize,
        size: usize,
        tags: &[Tag],
        projection: &[&str],
    ) -> Result<Vec<AssembledArticle>> {
        let tag_ids: Vec<String> = tags.iter().map(|t| t.id.clone()).collect();
        let mut fetched = HashSet::new();
        let ids = self
            .relations
            .article_ids(&tag_ids, page, size, &mut fetched)
            .await
            .map_err(|e| {
                store_failure(
                    format!("Gets articles by tags [tags={:?}, page={}, size={}]", tag_ids, page, size),
                    e,
                )
            })?;

        let hydrated = self.articles_by_ids(ids, projection).await?;
        let mut articles = self.organize_articles(hydrated).await?;
        self.attach_participants(&mut articles, self.config.tag_article_participants)
            .await?;
        Ok(articles)
    }

    pub async fn articles_by_city(&self, city: &str, page: usize, size: usize) -> Result<Vec<AssembledArticle>> {
        let query = Query::new()
            .filter(Filter::eq(fields::article::CITY, city))
            .desc(fields::ID)
            .page(page, size);
        let found = self
            .find::<Article>(Collection::Articles, &query, || {
                format!("Gets articles by city [city={}, page={}, size={}]", city, page, size)
            })
            .await?;
        let mut articles = self.organize_articles(found.items).await?;
        self.attach_participants(&mut articles, self.config.city_article_participants)
            .await?;
        Ok(articles)
    }

    pub async fn random_articles(&self, size: usize) -> Result<Vec<AssembledArticle>> {
        let docs = self
            .store
            .random(Collection::Articles, size)
            .await
            .map_err(|e| store_failure(format!("Gets random articles [size={}]", size), e))?;
        let articles = docs
            .into_iter()
            .map(|doc| crate::service::decode(Collection::Articles, doc))
            .collect::<Result<Vec<Article>>>()?;
        self.organize_articles(articles).await
    }

    pub async fn article_by_id(&self, id: &str) -> Result<Option<AssembledArticle>> {
        match self.article(id).await? {
            Some(article) => Ok(Some(self.organize_article(article).await?)),
            None => Ok(None),
        }
    }

    /// The stored article, without display fields.
    pub async fn article(&self, id: &str) -> Result<Option<Article>> {
        self.get(Collection::Articles, id, || format!("Gets an article [id={}]", id))
            .await
    }

    pub async fn article_by_client_article_id(
        &self,
        author_id: &str,
        client_article_id: &str,
    ) -> Result<Option<Article>> {
        let filter = Filter::all(vec![
            Filter::eq(fields::article::CLIENT_ARTICLE_ID, client_article_id),
            Filter::eq(fields::article::AUTHOR_ID, author_id),
        ]);
        self.find_one(Collection::Articles, filter, || {
            format!("Gets article [clientArticleId={}]", client_article_id)
        })
        .await
    }

    pub async fn user_articles(&self, user_id: &str, page: usize, size: usize) -> Result<Vec<AssembledArticle>> {
        let query = Query::new()
            .filter(Filter::eq(fields::article::AUTHOR_ID, user_id))
            .desc(fields::article::CREATE_TIME)
            .page(page, size);
        let found = self
            .find::<Article>(Collection::Articles, &query, || {
                format!("Gets user articles [user={}, page={}, size={}]", user_id, page, size)
            })
            .await?;
        self.organize_articles(found.items).await
    }

    /// Articles posted as broadcasts; content is dropped and permalinks are
    /// absolute.
    pub async fn broadcasts(&self, page: usize, size: usize) -> Result<Vec<Article>> {
        let query = Query::new()
            .filter(Filter::eq(
                fields::article::CLIENT_ARTICLE_ID,
                self.config.broadcast_client_id.as_str(),
            ))
            .desc(fields::article::CREATE_TIME)
            .page(page, size);
        let found = self
            .find::<Article>(Collection::Articles, &query, || {
                format!("Gets broadcasts [page={}, size={}]", page, size)
            })
            .await?;
        Ok(found
            .items
            .into_iter()
            .map(|mut article| {
                article.permalink = self.config.absolute(&article.permalink);
                article.content.clear();
                article
            })
            .collect())
    }

    /// Admin-authored articles under the news tag.
    pub async fn news(&self, page: usize, size: usize) -> Result<Vec<Article>> {
        let Some(tag) = self.tag_by_title(&self.config.news_tag).await? else {
            return Ok(Vec::new());
        };
        let mut fetched = HashSet::new();
        let ids = self
            .relations
            .article_ids(std::slice::from_ref(&tag.id), page, size, &mut fetched)
            .await
            .map_err(|e| store_failure(format!("Gets news [page={}, size={}]", page, size), e))?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = Query::new()
            .filter(Filter::all(vec![
                Filter::is_in(fields::ID, ids),
                Filter::eq(fields::article::AUTHOR_EMAIL, self.config.admin_email.as_str()),
            ]))
            .desc(fields::article::CREATE_TIME)
            .project(&[
                fields::ID,
                fields::article::TITLE,
                fields::article::PERMALINK,
                fields::article::CREATE_TIME,
            ]);
        let found = self
            .find::<Article>(Collection::Articles, &query, || "Gets news".to_string())
            .await?;
        Ok(self.absolute_permalinks(found.items))
    }

    /// Articles under any of `tag_titles` followed by the first page of
    /// recent articles, each id once. Only title, permalink and create time
    /// are filled; blocked articles carry the block title.
    pub async fn interests(&self, page: usize, size: usize, tag_titles: &[&str]) -> Result<Vec<Article>> {
        let mut tag_ids = Vec::new();
        for title in tag_titles {
            match self.tag_by_title(title).await? {
                Some(tag) => tag_ids.push(tag.id),
                None => warn!("Interest tag [{}] not found", title),
            }
        }

        let projection = [
            fields::ID,
            fields::article::TITLE,
            fields::article::STATUS,
            fields::article::PERMALINK,
            fields::article::CREATE_TIME,
        ];

        let mut out = Vec::new();
        if !tag_ids.is_empty() {
            let mut fetched = HashSet::new();
            let ids = self
                .relations
                .article_ids(&tag_ids, page, size, &mut fetched)
                .await
                .map_err(|e| {
                    store_failure(
                        format!("Gets interests [tags={:?}, page={}, size={}]", tag_ids, page, size),
                        e,
                    )
                })?;
            out.extend(self.articles_by_ids(ids, &projection).await?);
        }

        let query = Query::new()
            .filter(showing_filter())
            .desc(fields::ID)
            .page(1, size)
            .project(&projection);
        let recent = self
            .find::<Article>(Collection::Articles, &query, || {
                format!("Gets interests [page={}, size={}]", page, size)
            })
            .await?;
        out.extend(recent.items);

        let block_title = self.collab.labels.get(labels::ARTICLE_TITLE_BLOCK);
        let mut seen = HashSet::new();
        out.retain(|article| seen.insert(article.id.clone()));
        for article in out.iter_mut().filter(|a| a.is_blocked()) {
            article.title = block_title.clone();
        }
        Ok(self.absolute_permalinks(out))
    }

    /// Paged listing of every article by update time, with a pagination
    /// descriptor.
    pub async fn list_articles(&self, request: &ArticleListRequest) -> Result<ArticleListing> {
        let mut query = Query::new()
            .desc(fields::article::UPDATE_TIME)
            .page(request.page, request.page_size);
        if let Some(id) = &request.id {
            query = query.filter(Filter::eq(fields::ID, id.as_str()));
        }
        let found = self
            .find::<Article>(Collection::Articles, &query, || {
                format!("Gets articles [page={}, size={}]", request.page, request.page_size)
            })
            .await?;

        let pagination = Pagination::from_page_count(
            request.page,
            request.page_size,
            found.page_count,
            request.window_size,
        );
        let articles = self.organize_articles(found.items).await?;
        Ok(ArticleListing {
            articles,
            pagination,
        })
    }

    pub(crate) async fn articles_by_ids(&self, ids: Vec<String>, projection: &[&str]) -> Result<Vec<Article>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let count = ids.len();
        let mut query = Query::new()
            .filter(Filter::is_in(fields::ID, ids))
            .desc(fields::ID);
        if !projection.is_empty() {
            query = query.project(projection);
            if !projection.contains(&fields::ID) {
                query = query.project(&[fields::ID]);
            }
        }
        let found = self
            .find::<Article>(Collection::Articles, &query, || {
                format!("Gets articles by ids [count={}]", count)
            })
            .await?;
        Ok(found.items)
    }

    /// Replaces the title of articles whose author account is invalid.
    async fn block_invalid_authors(&self, articles: &mut [AssembledArticle]) -> Result<()> {
        for assembled in articles.iter_mut() {
            let author_id = &assembled.article.author_id;
            match self.user(author_id).await? {
                Some(author) if author.is_blocked() => {
                    let title = self.collab.labels.get(labels::ARTICLE_TITLE_BLOCK);
                    assembled.article.title = title.clone();
                    assembled.title_emoji = title;
                }
                Some(_) => {}
                None => warn!(
                    "Author [{}] of article [{}] not found",
                    author_id, assembled.article.id
                ),
            }
        }
        Ok(())
    }

    fn absolute_permalinks(&self, articles: Vec<Article>) -> Vec<Article> {
        articles
            .into_iter()
            .map(|mut article| {
                article.permalink = self.config.absolute(&article.permalink);
                article
            })
            .collect()
    }
}
