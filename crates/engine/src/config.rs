use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationMode {
    /// Page over raw relation rows on every call.
    #[default]
    Rows,
    /// Page over a materialized tag → article index.
    Index,
}

/// Knobs of the article query engine. Every field has a default so partial
/// configuration files deserialize.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Absolute prefix for permalinks and profile links, without trailing slash.
    pub serve_path: String,
    pub hot_window_days: i64,
    pub relevant_tag_count: usize,
    pub latest_article_participants: usize,
    pub index_article_participants: usize,
    pub tag_article_participants: usize,
    pub city_article_participants: usize,
    pub default_thumbnail_url: String,
    pub default_commenter_email: String,
    /// Client article id that marks an article as a broadcast.
    pub broadcast_client_id: String,
    pub news_tag: String,
    /// Author whose articles under `news_tag` count as news.
    pub admin_email: String,
    pub relation_mode: RelationMode,
    /// Seconds between index reloads in index mode; 0 keeps the startup
    /// snapshot.
    pub relation_refresh_secs: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            serve_path: "http://localhost:3000".to_string(),
            hot_window_days: 15,
            relevant_tag_count: 3,
            latest_article_participants: 6,
            index_article_participants: 6,
            tag_article_participants: 6,
            city_article_participants: 6,
            default_thumbnail_url: "/images/user-thumbnail.png".to_string(),
            default_commenter_email: "default_commenter@agora.local".to_string(),
            broadcast_client_id: "aBroadcast".to_string(),
            news_tag: "Announcement".to_string(),
            admin_email: "admin@agora.local".to_string(),
            relation_mode: RelationMode::Rows,
            relation_refresh_secs: 300,
        }
    }
}

impl QueryConfig {
    pub fn absolute(&self, path: &str) -> String {
        format!("{}{}", self.serve_path.trim_end_matches('/'), path)
    }

    pub fn member_url(&self, name: &str) -> String {
        self.absolute(&format!("/member/{}", name))
    }
}
