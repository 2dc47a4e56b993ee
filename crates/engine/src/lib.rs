//! Article retrieval and content assembly for the forum read path.

mod assembly;
pub mod config;
mod error;
mod mentions;
mod participants;
pub mod providers;
mod relation;
mod relevance;
mod selector;
mod service;
mod stories;
mod traits;
mod visibility;

#[cfg(test)]
mod testing;

pub use assembly::{format_view_count, AssembledArticle};
pub use config::{QueryConfig, RelationMode};
pub use error::{Result, ServiceError};
pub use mentions::mention_tokens;
pub use participants::Participant;
pub use relation::{RelationSource, StoreRelations, TagArticleIndex};
pub use selector::{ArticleListRequest, ArticleListing};
pub use service::{ArticleService, Collaborators};
pub use stories::{Story, StoryComment};
pub use traits::{
    AvatarResolver, EmojiConverter, LangProps, MarkdownRenderer, ShortLinker, ViewCounter,
};
pub use visibility::{RenderedArticle, Visibility};
