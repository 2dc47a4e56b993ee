//! Document field names, one module per collection. Filters and sorts are
//! built against these so a renamed model field only changes here.

pub const ID: &str = "id";

pub mod article {
    pub const TITLE: &str = "title";
    pub const CONTENT: &str = "content";
    pub const TYPE: &str = "article_type";
    pub const STATUS: &str = "status";
    pub const AUTHOR_ID: &str = "author_id";
    pub const AUTHOR_EMAIL: &str = "author_email";
    pub const TAGS: &str = "tags";
    pub const CITY: &str = "city";
    pub const CREATE_TIME: &str = "create_time";
    pub const UPDATE_TIME: &str = "update_time";
    pub const LATEST_CMT_TIME: &str = "latest_cmt_time";
    pub const COMMENT_CNT: &str = "comment_cnt";
    pub const VIEW_CNT: &str = "view_cnt";
    pub const REDDIT_SCORE: &str = "reddit_score";
    pub const CLIENT_ARTICLE_ID: &str = "client_article_id";
    pub const PERMALINK: &str = "permalink";
}

pub mod tag {
    pub const TITLE: &str = "title";
}

pub mod tag_article {
    pub const TAG_ID: &str = "tag_id";
    pub const ARTICLE_ID: &str = "article_id";
}

pub mod comment {
    pub const ON_ARTICLE_ID: &str = "on_article_id";
    pub const AUTHOR_EMAIL: &str = "author_email";
    pub const CREATE_TIME: &str = "create_time";
}

pub mod user {
    pub const EMAIL: &str = "email";
    pub const NAME: &str = "name";
}
