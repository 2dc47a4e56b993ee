//! Per-viewer content rendering of a single article.

use crate::assembly::AssembledArticle;
use crate::error::{store_failure, Result};
use crate::providers::labels;
use crate::service::ArticleService;
use domain::{Article, ArticleType, User, Viewer};
use serde::Serialize;

/// What a viewer may see of an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Visibility {
    /// Article or author is invalid; placeholders only.
    Blocked,
    /// A discussion the viewer was not invited to.
    DiscussionRestricted { author_name: String },
    Open,
}

impl Visibility {
    /// `mentions` are the user names mentioned in the article body. Anonymous
    /// viewers are never the author, an admin, or invited.
    pub fn decide(
        article: &Article,
        author: Option<&User>,
        viewer: Option<&Viewer>,
        mentions: &[String],
    ) -> Self {
        if author.is_some_and(User::is_blocked) || article.is_blocked() {
            return Visibility::Blocked;
        }
        if article.article_type != ArticleType::Discussion {
            return Visibility::Open;
        }

        let author_name = author.map(|u| u.name.as_str()).unwrap_or("");
        let allowed = viewer.is_some_and(|v| {
            !v.name.is_empty()
                && (v.name == author_name || v.is_admin() || mentions.iter().any(|m| *m == v.name))
        });
        if allowed {
            Visibility::Open
        } else {
            Visibility::DiscussionRestricted {
                author_name: author_name.to_string(),
            }
        }
    }
}

/// An article rendered for one viewer.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedArticle {
    #[serde(flatten)]
    pub assembled: AssembledArticle,
    pub discussion_viewable: bool,
    pub visibility: Visibility,
}

fn escape_for_embedding(html: &str) -> String {
    html.replace('\n', "\\n")
        .replace('\'', "\\'")
        .replace('"', "\\\"")
}

impl ArticleService {
    /// Renders the body of a single article for `viewer`. Listings never go
    /// through this.
    pub async fn process_article_content(
        &self,
        mut assembled: AssembledArticle,
        viewer: Option<&Viewer>,
    ) -> Result<RenderedArticle> {
        let mentions = self.mentioned_users(&assembled.article.content).await?;
        let visibility = Visibility::decide(
            &assembled.article,
            assembled.author.as_ref(),
            viewer,
            &mentions,
        );

        let article = &mut assembled.article;
        match &visibility {
            Visibility::Blocked => {
                let title = self.collab.labels.get(labels::ARTICLE_TITLE_BLOCK);
                article.title = title.clone();
                assembled.title_emoji = title;
                article.content = self.collab.labels.get(labels::ARTICLE_CONTENT_BLOCK);
                article.reward_content.clear();
                article.reward_point = 0;
            }
            Visibility::DiscussionRestricted { author_name } => {
                let link = format!(
                    "<a href='{}'>{}</a>",
                    self.config.member_url(author_name),
                    author_name
                );
                article.content = self
                    .collab
                    .labels
                    .get(labels::ARTICLE_DISCUSSION)
                    .replace("{user}", &link);
                article.reward_content.clear();
                article.reward_point = 0;
            }
            Visibility::Open => self.render_open(article, &mentions).await?,
        }

        Ok(RenderedArticle {
            assembled,
            discussion_viewable: visibility == Visibility::Open,
            visibility,
        })
    }

    async fn render_open(&self, article: &mut Article, mentions: &[String]) -> Result<()> {
        let short_links = &self.collab.short_links;
        let emoji = &self.collab.emoji;
        let context = || format!("Links article [{}] content", article.id);

        let content = self.link_mentions(&article.content, mentions);
        let content = short_links
            .link_article(&content)
            .await
            .map_err(|e| store_failure(context(), e))?;
        let content = short_links
            .link_tag(&content)
            .await
            .map_err(|e| store_failure(context(), e))?;
        let content = emoji.convert(&content);

        let base_url = self.config.absolute(&article.permalink);
        let markdown = &self.collab.markdown;
        article.content = if article.article_type == ArticleType::Thought {
            escape_for_embedding(&markdown.clean_thought(&content, &base_url))
        } else {
            markdown.clean(&markdown.to_html(&content), &base_url)
        };

        if article.reward_point > 0 {
            let reward_users = self.mentioned_users(&article.reward_content).await?;
            let reward = self.link_mentions(&article.reward_content, &reward_users);
            let reward = emoji.convert(&reward);
            article.reward_content = markdown.clean(&markdown.to_html(&reward), &base_url);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seed, service, NOW};
    use domain::{ArticleStatus, UserRole, UserStatus};
    use serde_json::json;
    use storage::{Collection, MemoryStore};

    fn user(name: &str, status: UserStatus) -> User {
        User {
            name: name.to_string(),
            status,
            ..Default::default()
        }
    }

    fn discussion() -> Article {
        Article {
            article_type: ArticleType::Discussion,
            content: "hey @ann @bob".to_string(),
            ..Default::default()
        }
    }

    fn mentions() -> Vec<String> {
        vec!["ann".to_string(), "bob".to_string()]
    }

    #[test]
    fn blocked_wins_over_everything() {
        let author = user("x", UserStatus::Invalid);
        let admin = Viewer::new("root", UserRole::Admin);
        assert_eq!(
            Visibility::decide(&discussion(), Some(&author), Some(&admin), &mentions()),
            Visibility::Blocked
        );

        let invalid = Article {
            status: ArticleStatus::Invalid,
            ..Default::default()
        };
        assert_eq!(
            Visibility::decide(&invalid, None, None, &[]),
            Visibility::Blocked
        );
    }

    #[test]
    fn discussion_is_open_to_author_admin_and_mentioned() {
        let author = user("x", UserStatus::Valid);
        let article = discussion();
        for viewer in [
            Viewer::new("x", UserRole::Member),
            Viewer::new("root", UserRole::Admin),
            Viewer::new("ann", UserRole::Member),
            Viewer::new("bob", UserRole::Member),
        ] {
            assert_eq!(
                Visibility::decide(&article, Some(&author), Some(&viewer), &mentions()),
                Visibility::Open,
                "{:?}",
                viewer
            );
        }
    }

    #[test]
    fn discussion_is_closed_to_everyone_else() {
        let author = user("x", UserStatus::Valid);
        let restricted = Visibility::DiscussionRestricted {
            author_name: "x".to_string(),
        };
        let carol = Viewer::new("carol", UserRole::Member);
        assert_eq!(
            Visibility::decide(&discussion(), Some(&author), Some(&carol), &mentions()),
            restricted
        );
        assert_eq!(
            Visibility::decide(&discussion(), Some(&author), None, &mentions()),
            restricted
        );
        // 作者缺失时匿名访客也不能算作者
        let nameless = Viewer::new("", UserRole::Member);
        assert!(matches!(
            Visibility::decide(&discussion(), None, Some(&nameless), &[]),
            Visibility::DiscussionRestricted { .. }
        ));
    }

    async fn store() -> MemoryStore {
        let store = MemoryStore::new();
        seed(&store, Collection::Users, vec![
            json!({ "id": "u1", "email": "x@example.com", "name": "x" }),
            json!({ "id": "u2", "email": "ann@example.com", "name": "ann" }),
            json!({ "id": "u3", "email": "carol@example.com", "name": "carol" }),
        ])
        .await;
        seed(&store, Collection::Tags, vec![json!({ "id": "t1", "title": "rust" })]).await;
        store
    }

    fn open_article(kind: ArticleType) -> Article {
        Article {
            id: "1699999000000".to_string(),
            title: "t".to_string(),
            article_type: kind,
            author_email: "x@example.com".to_string(),
            content: "**hi** @ann about #rust# :rocket:\n<script>alert(1)</script>".to_string(),
            permalink: "/article/1699999000000".to_string(),
            reward_point: 10,
            reward_content: "thanks @ann :tada:".to_string(),
            create_time: NOW,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn invited_reader_gets_rendered_markdown() {
        let svc = service(store().await);
        let ann = Viewer::new("ann", UserRole::Member);
        let mut article = open_article(ArticleType::Discussion);
        article.content = "**secret** for @ann".to_string();
        let assembled = svc.organize_at(article, NOW).await.unwrap();

        let rendered = svc.process_article_content(assembled, Some(&ann)).await.unwrap();
        assert!(rendered.discussion_viewable);
        assert_eq!(rendered.visibility, Visibility::Open);
        assert!(rendered.assembled.article.content.contains("<strong>secret</strong>"));
        assert!(rendered
            .assembled
            .article
            .content
            .contains("https://forum.example/member/ann"));
    }

    #[tokio::test]
    async fn uninvited_reader_gets_invitation_placeholder() {
        let svc = service(store().await);
        let carol = Viewer::new("carol", UserRole::Member);
        let assembled = svc
            .organize_at(open_article(ArticleType::Discussion), NOW)
            .await
            .unwrap();

        let rendered = svc.process_article_content(assembled, Some(&carol)).await.unwrap();
        let article = &rendered.assembled.article;
        assert!(!rendered.discussion_viewable);
        assert_eq!(
            article.content,
            "This is a private discussion started by <a href='https://forum.example/member/x'>x</a>. \
             Only invited members can read it."
        );
        assert_eq!(article.reward_point, 0);
        assert!(article.reward_content.is_empty());
    }

    #[tokio::test]
    async fn open_article_links_mentions_tags_and_emoji_then_cleans() {
        let svc = service(store().await);
        let assembled = svc.organize_at(open_article(ArticleType::Normal), NOW).await.unwrap();
        let rendered = svc.process_article_content(assembled, None).await.unwrap();
        let article = &rendered.assembled.article;

        assert!(rendered.discussion_viewable);
        assert!(article.content.contains("<strong>hi</strong>"));
        assert!(article.content.contains(r#"href="https://forum.example/member/ann""#));
        assert!(article.content.contains(r#"href="https://forum.example/tag/rust""#));
        assert!(article.content.contains("🚀"));
        assert!(!article.content.contains("<script"));
        assert!(article.reward_content.contains("🎉"));
        assert!(article.reward_content.contains("https://forum.example/member/ann"));
    }

    #[tokio::test]
    async fn thought_content_is_cleaned_and_escaped() {
        let svc = service(store().await);
        let mut article = open_article(ArticleType::Thought);
        article.content = "<span class=\"x\">it's</span>\n<iframe src=\"https://v.example/1\"></iframe>".to_string();
        let assembled = svc.organize_at(article, NOW).await.unwrap();
        let rendered = svc.process_article_content(assembled, None).await.unwrap();
        let content = &rendered.assembled.article.content;

        assert!(content.contains(r#"<span class=\"x\">it\'s</span>"#));
        assert!(content.contains("\\n"));
        assert!(!content.contains('\n'));
        assert!(content.contains("<iframe"));
    }

    #[tokio::test]
    async fn blocked_author_short_circuits() {
        let store = store().await;
        seed(&store, Collection::Users, vec![
            json!({ "id": "u1", "email": "x@example.com", "name": "x", "status": "invalid" }),
        ])
        .await;
        let svc = service(store);
        let assembled = svc.organize_at(open_article(ArticleType::Normal), NOW).await.unwrap();
        let rendered = svc.process_article_content(assembled, None).await.unwrap();

        assert_eq!(rendered.visibility, Visibility::Blocked);
        assert!(!rendered.discussion_viewable);
        assert_eq!(rendered.assembled.article.title, "This article has been blocked");
        assert_eq!(rendered.assembled.article.reward_point, 0);
    }
}
