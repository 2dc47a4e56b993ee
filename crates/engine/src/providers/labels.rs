use crate::traits::LangProps;
use std::collections::HashMap;

pub const ARTICLE_TITLE_BLOCK: &str = "article_title_block";
pub const ARTICLE_CONTENT_BLOCK: &str = "article_content_block";
/// Contains a `{user}` placeholder for the author's profile link.
pub const ARTICLE_DISCUSSION: &str = "article_discussion";
pub const JUST_NOW: &str = "just_now";
pub const MINUTES_AGO: &str = "minutes_ago";
pub const HOURS_AGO: &str = "hours_ago";
pub const DAYS_AGO: &str = "days_ago";
pub const WEEKS_AGO: &str = "weeks_ago";
pub const MONTHS_AGO: &str = "months_ago";
pub const YEARS_AGO: &str = "years_ago";

const DEFAULTS: &[(&str, &str)] = &[
    (ARTICLE_TITLE_BLOCK, "This article has been blocked"),
    (
        ARTICLE_CONTENT_BLOCK,
        "The content of this article has been blocked by the administrator.",
    ),
    (
        ARTICLE_DISCUSSION,
        "This is a private discussion started by {user}. Only invited members can read it.",
    ),
    (JUST_NOW, "just now"),
    (MINUTES_AGO, "minutes ago"),
    (HOURS_AGO, "hours ago"),
    (DAYS_AGO, "days ago"),
    (WEEKS_AGO, "weeks ago"),
    (MONTHS_AGO, "months ago"),
    (YEARS_AGO, "years ago"),
];

/// Built-in English labels with per-key overrides.
#[derive(Debug, Clone)]
pub struct LabelTable {
    labels: HashMap<String, String>,
}

impl LabelTable {
    pub fn new(overrides: HashMap<String, String>) -> Self {
        let mut labels: HashMap<String, String> = DEFAULTS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        labels.extend(overrides);
        Self { labels }
    }
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::new(HashMap::new())
    }
}

impl LangProps for LabelTable {
    fn get(&self, key: &str) -> String {
        self.labels
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}
