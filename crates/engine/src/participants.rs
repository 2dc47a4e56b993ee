use crate::assembly::AssembledArticle;
use crate::error::Result;
use crate::service::ArticleService;
use domain::{fields, Comment};
use serde::Serialize;
use storage::{Collection, Filter, Query};
use tracing::warn;

/// A recent commenter shown next to an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant {
    pub name: String,
    pub thumbnail_url: String,
    pub thumbnail_update_time: i64,
    pub url: String,
    pub comment_id: String,
}

impl ArticleService {
    /// The `count` most recent comments of an article, one entry per comment.
    /// The same user commenting twice shows up twice.
    pub async fn latest_participants(&self, article_id: &str, count: usize) -> Result<Vec<Participant>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let query = Query::new()
            .filter(Filter::eq(fields::comment::ON_ARTICLE_ID, article_id))
            .desc(fields::comment::CREATE_TIME)
            .desc(fields::ID)
            .page(1, count)
            .project(&[fields::ID, fields::comment::AUTHOR_EMAIL]);
        let comments = self
            .find::<Comment>(Collection::Comments, &query, || {
                format!("Gets article [{}] participants", article_id)
            })
            .await?;

        let mut participants = Vec::with_capacity(comments.items.len());
        for comment in comments.items {
            let email = comment.author_email;
            let commenter = self.user_by_email(&email).await?;
            if commenter.is_none() {
                warn!("Commenter [{}] of comment [{}] not found", email, comment.id);
            }

            let thumbnail_url = self.commenter_thumbnail(&email);
            let (name, url, thumbnail_update_time) = commenter
                .map(|u| (u.name, u.url, u.update_time))
                .unwrap_or_default();

            participants.push(Participant {
                name,
                thumbnail_url,
                thumbnail_update_time,
                url,
                comment_id: comment.id,
            });
        }
        Ok(participants)
    }

    /// The shared anonymous account gets the default thumbnail.
    pub(crate) fn commenter_thumbnail(&self, email: &str) -> String {
        if email == self.config.default_commenter_email {
            self.config.default_thumbnail_url.clone()
        } else {
            self.collab.avatars.avatar_url(email)
        }
    }

    pub(crate) async fn attach_participants(
        &self,
        articles: &mut [AssembledArticle],
        count: usize,
    ) -> Result<()> {
        for assembled in articles.iter_mut() {
            assembled.participants = self.latest_participants(&assembled.article.id, count).await?;
        }
        Ok(())
    }
}
