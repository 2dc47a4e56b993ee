//! Story feed: recent or top articles flattened together with their full
//! comment threads, for feed-style clients.

use crate::assembly::AssembledArticle;
use crate::error::Result;
use crate::participants::Participant;
use crate::providers::labels;
use crate::selector::{recent_query, top_query};
use crate::service::ArticleService;
use domain::time::millis_to_datetime;
use domain::{fields, Article, Comment, User};
use serde::Serialize;
use std::collections::HashMap;
use storage::{Collection, Filter, Query};
use tracing::warn;

const STORY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Story {
    pub id: String,
    pub title: String,
    pub url: String,
    pub user_display_name: String,
    pub user_job: String,
    pub comment_html: String,
    pub comment_count: i64,
    pub vote_count: i64,
    pub created_at: String,
    pub user_portrait_url: String,
    pub comments: Vec<StoryComment>,
    /// First tag of the article, empty when untagged.
    pub badge: String,
    pub participants: Vec<Participant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoryComment {
    pub id: String,
    pub body_html: String,
    /// Threads are flat.
    pub depth: u32,
    pub user_display_name: String,
    pub user_job: String,
    pub vote_count: i64,
    pub created_at: String,
    pub user_portrait_url: String,
}

fn story_time(millis: i64) -> String {
    millis_to_datetime(millis).format(STORY_TIME_FORMAT).to_string()
}

impl ArticleService {
    /// The recent listing as stories.
    pub async fn recent_stories(&self, page: usize, size: usize) -> Result<Vec<Story>> {
        self.stories(&recent_query(page, size), || {
            format!("Gets recent stories [page={}, size={}]", page, size)
        })
        .await
    }

    /// The top listing as stories.
    pub async fn top_stories(&self, page: usize, size: usize) -> Result<Vec<Story>> {
        self.stories(&top_query(page, size), || {
            format!("Gets top stories [page={}, size={}]", page, size)
        })
        .await
    }

    async fn stories(&self, query: &Query, context: impl FnOnce() -> String) -> Result<Vec<Story>> {
        let found = self
            .find::<Article>(Collection::Articles, query, context)
            .await?;
        let articles = self.organize_articles(found.items).await?;

        let mut stories = Vec::with_capacity(articles.len());
        for assembled in articles {
            stories.push(self.story(assembled).await?);
        }
        Ok(stories)
    }

    async fn story(&self, assembled: AssembledArticle) -> Result<Story> {
        let AssembledArticle {
            article,
            author,
            author_name,
            author_thumbnail_url,
            ..
        } = assembled;

        let title = if author.as_ref().is_some_and(User::is_blocked) {
            self.collab.labels.get(labels::ARTICLE_TITLE_BLOCK)
        } else {
            article.title.clone()
        };
        let badge = article
            .tag_titles()
            .first()
            .map(|t| t.to_string())
            .unwrap_or_default();
        let comments = self.all_comments(&article.id).await?;
        let participants = self
            .latest_participants(&article.id, self.config.index_article_participants)
            .await?;

        Ok(Story {
            title,
            url: self.config.absolute(&article.permalink),
            user_display_name: author_name.unwrap_or_default(),
            user_job: author.map(|u| u.intro).unwrap_or_default(),
            comment_html: article.content,
            comment_count: article.comment_cnt,
            vote_count: article.good_cnt,
            created_at: story_time(article.create_time),
            user_portrait_url: author_thumbnail_url.unwrap_or_default(),
            comments,
            badge,
            participants,
            id: article.id,
        })
    }

    /// Every comment of an article, oldest first.
    pub async fn all_comments(&self, article_id: &str) -> Result<Vec<StoryComment>> {
        let query = Query::new()
            .filter(Filter::eq(fields::comment::ON_ARTICLE_ID, article_id))
            .asc(fields::comment::CREATE_TIME)
            .asc(fields::ID);
        let found = self
            .find::<Comment>(Collection::Comments, &query, || {
                format!("Gets article [{}] comments", article_id)
            })
            .await?;

        // 同一评论者只查一次
        let mut commenters: HashMap<String, Option<User>> = HashMap::new();
        let mut comments = Vec::with_capacity(found.items.len());
        for comment in found.items {
            if !commenters.contains_key(&comment.author_email) {
                let user = self.user_by_email(&comment.author_email).await?;
                if user.is_none() {
                    warn!(
                        "Commenter [{}] of comment [{}] not found",
                        comment.author_email, comment.id
                    );
                }
                commenters.insert(comment.author_email.clone(), user);
            }
            let commenter = commenters.get(&comment.author_email).and_then(Option::as_ref);

            comments.push(StoryComment {
                body_html: comment.content,
                depth: 0,
                user_display_name: commenter.map(|u| u.name.clone()).unwrap_or_default(),
                user_job: commenter.map(|u| u.intro.clone()).unwrap_or_default(),
                vote_count: 0,
                created_at: story_time(comment.create_time),
                user_portrait_url: self.commenter_thumbnail(&comment.author_email),
                id: comment.id,
            });
        }
        Ok(comments)
    }
}
