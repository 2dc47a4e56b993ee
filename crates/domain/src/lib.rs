pub mod fields;
mod models;
pub mod pagination;
pub mod time;

pub use models::{
    Article, ArticleStatus, ArticleType, Comment, Tag, TagArticle, User, UserRole, UserStatus,
    Viewer,
};
pub use pagination::Pagination;
