use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleType {
    #[default]
    Normal,
    Discussion,
    CityBroadcast,
    Thought,
}

impl ArticleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleType::Normal => "normal",
            ArticleType::Discussion => "discussion",
            ArticleType::CityBroadcast => "city_broadcast",
            ArticleType::Thought => "thought",
        }
    }
}

impl fmt::Display for ArticleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleStatus {
    #[default]
    Valid,
    Invalid,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Valid => "valid",
            ArticleStatus::Invalid => "invalid",
        }
    }
}

/// A stored article. Every field falls back to its default so that projected
/// documents (only a few fields selected) still decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub content: String,
    pub article_type: ArticleType,
    pub status: ArticleStatus,
    pub author_id: String,
    pub author_email: String,
    /// Comma-joined tag titles, e.g. `"rust,async"`.
    pub tags: String,
    pub city: String,
    pub create_time: i64,
    pub update_time: i64,
    pub latest_cmt_time: i64,
    pub comment_cnt: i64,
    pub view_cnt: i64,
    pub good_cnt: i64,
    pub reward_point: i64,
    pub reward_content: String,
    pub reddit_score: f64,
    pub client_article_id: String,
    pub permalink: String,
}

impl Article {
    pub fn tag_titles(&self) -> Vec<&str> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }

    pub fn is_blocked(&self) -> bool {
        self.status == ArticleStatus::Invalid
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tag {
    pub id: String,
    pub title: String,
}

/// Relation row linking one tag to one article.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagArticle {
    pub id: String,
    pub tag_id: String,
    pub article_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Comment {
    pub id: String,
    pub on_article_id: String,
    pub author_id: String,
    pub author_email: String,
    pub content: String,
    pub create_time: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    #[default]
    Valid,
    Invalid,
    Unverified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    #[default]
    Member,
    DefaultCommenter,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub url: String,
    pub status: UserStatus,
    pub role: UserRole,
    pub intro: String,
    pub update_time: i64,
}

impl User {
    pub fn is_blocked(&self) -> bool {
        self.status == UserStatus::Invalid
    }
}

/// The requesting user, as resolved by the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub name: String,
    pub role: UserRole,
}

impl Viewer {
    pub fn new(name: impl Into<String>, role: UserRole) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl From<&User> for Viewer {
    fn from(user: &User) -> Self {
        Self::new(user.name.clone(), user.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_titles_are_trimmed_and_skip_empty() {
        let article = Article {
            tags: " rust, async ,,web ".to_string(),
            ..Default::default()
        };
        assert_eq!(article.tag_titles(), vec!["rust", "async", "web"]);

        let untagged = Article::default();
        assert!(untagged.tag_titles().is_empty());
    }

    #[test]
    fn projected_document_decodes_with_defaults() {
        let doc = serde_json::json!({ "id": "1450000000000", "title": "hello" });
        let article: Article = serde_json::from_value(doc).unwrap();
        assert_eq!(article.title, "hello");
        assert_eq!(article.article_type, ArticleType::Normal);
        assert_eq!(article.status, ArticleStatus::Valid);
    }

    #[test]
    fn enums_use_snake_case_on_the_wire() {
        let value = serde_json::to_value(ArticleType::CityBroadcast).unwrap();
        assert_eq!(value, "city_broadcast");
        assert_eq!(ArticleType::Discussion.as_str(), "discussion");
        let role: UserRole = serde_json::from_value(serde_json::json!("default_commenter")).unwrap();
        assert_eq!(role, UserRole::DefaultCommenter);
    }
}
