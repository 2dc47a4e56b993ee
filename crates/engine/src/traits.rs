use anyhow::Result;
use async_trait::async_trait;

/// Localized string lookup by key.
pub trait LangProps: Send + Sync {
    fn get(&self, key: &str) -> String;
}

pub trait AvatarResolver: Send + Sync {
    fn avatar_url(&self, email: &str) -> String;
}

pub trait MarkdownRenderer: Send + Sync {
    fn to_html(&self, markdown: &str) -> String;

    /// Link-safety cleaning; relative URLs resolve against `base_url` when it
    /// is a valid absolute URL.
    fn clean(&self, html: &str, base_url: &str) -> String;

    /// Relaxed allow-list used for "thought" articles, which are stored as HTML.
    fn clean_thought(&self, html: &str, base_url: &str) -> String;
}

pub trait EmojiConverter: Send + Sync {
    fn convert(&self, text: &str) -> String;
}

#[async_trait]
pub trait ShortLinker: Send + Sync {
    async fn link_article(&self, content: &str) -> Result<String>;

    async fn link_tag(&self, content: &str) -> Result<String>;
}

/// Read-only view of the live "currently viewing" counters. The writer lives
/// outside the engine and must make increments safe under concurrent reads.
pub trait ViewCounter: Send + Sync {
    fn viewing(&self, article_id: &str) -> Option<u32>;
}
