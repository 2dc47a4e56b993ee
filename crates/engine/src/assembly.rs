use crate::error::Result;
use crate::participants::Participant;
use crate::providers::labels;
use crate::service::ArticleService;
use chrono::{DateTime, Utc};
use domain::time::{millis_to_datetime, Elapsed};
use domain::{Article, User};
use serde::Serialize;
use tracing::warn;

/// An article plus the fields synthesized for display. Built per request,
/// never stored.
#[derive(Debug, Clone, Serialize)]
pub struct AssembledArticle {
    #[serde(flatten)]
    pub article: Article,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub latest_cmt_at: DateTime<Utc>,
    pub time_ago: String,
    pub author_name: Option<String>,
    pub author_thumbnail_url: Option<String>,
    #[serde(skip)]
    pub author: Option<User>,
    pub title_emoji: String,
    /// Number of readers currently on the article page.
    pub heat: u32,
    pub view_cnt_display: Option<String>,
    pub participants: Vec<Participant>,
}

/// `1500 → "1.5K"`, rounded half up to one decimal. Counts below 1000 have
/// no display form.
pub fn format_view_count(view_cnt: i64) -> Option<String> {
    if view_cnt < 1000 {
        return None;
    }
    let tenths = view_cnt.saturating_mul(10).saturating_add(500) / 1000;
    let (whole, frac) = (tenths / 10, tenths % 10);
    if frac == 0 {
        Some(format!("{}K", whole))
    } else {
        Some(format!("{}.{}K", whole, frac))
    }
}

impl ArticleService {
    pub async fn organize_articles(&self, articles: Vec<Article>) -> Result<Vec<AssembledArticle>> {
        let now = Utc::now().timestamp_millis();
        let mut out = Vec::with_capacity(articles.len());
        for article in articles {
            out.push(self.organize_at(article, now).await?);
        }
        Ok(out)
    }

    pub async fn organize_article(&self, article: Article) -> Result<AssembledArticle> {
        self.organize_at(article, Utc::now().timestamp_millis()).await
    }

    pub(crate) async fn organize_at(&self, mut article: Article, now: i64) -> Result<AssembledArticle> {
        let time_ago = self.time_ago(now, article.create_time);

        let mut author = None;
        let mut author_name = None;
        let mut author_thumbnail_url = None;
        if !article.author_email.is_empty() {
            match self.user_by_email(&article.author_email).await? {
                Some(user) => {
                    author_thumbnail_url = Some(self.collab.avatars.avatar_url(&article.author_email));
                    author_name = Some(user.name.clone());
                    author = Some(user);
                }
                None => warn!(
                    "Author [{}] of article [{}] not found",
                    article.author_email, article.id
                ),
            }
        }

        let escaped = article.title.replace('<', "&lt;").replace('>', "&gt;");
        article.title = self.collab.markdown.clean(&escaped, "");
        let mut title_emoji = self.collab.emoji.convert(&article.title);

        if article.is_blocked() {
            let blocked = self.collab.labels.get(labels::ARTICLE_TITLE_BLOCK);
            article.title = blocked.clone();
            title_emoji = blocked;
            article.content = self.collab.labels.get(labels::ARTICLE_CONTENT_BLOCK);
        }

        let heat = self.collab.views.viewing(&article.id).unwrap_or(0);
        let view_cnt_display = format_view_count(article.view_cnt);

        Ok(AssembledArticle {
            created_at: millis_to_datetime(article.create_time),
            updated_at: millis_to_datetime(article.update_time),
            latest_cmt_at: millis_to_datetime(article.latest_cmt_time),
            article,
            time_ago,
            author_name,
            author_thumbnail_url,
            author,
            title_emoji,
            heat,
            view_cnt_display,
            participants: Vec::new(),
        })
    }

    fn time_ago(&self, now: i64, then: i64) -> String {
        let props = &self.collab.labels;
        let (n, key) = match Elapsed::between(now, then) {
            Elapsed::JustNow => return props.get(labels::JUST_NOW),
            Elapsed::Minutes(n) => (n, labels::MINUTES_AGO),
            Elapsed::Hours(n) => (n, labels::HOURS_AGO),
            Elapsed::Days(n) => (n, labels::DAYS_AGO),
            Elapsed::Weeks(n) => (n, labels::WEEKS_AGO),
            Elapsed::Months(n) => (n, labels::MONTHS_AGO),
            Elapsed::Years(n) => (n, labels::YEARS_AGO),
        };
        format!("{} {}", n, props.get(key))
    }
}
