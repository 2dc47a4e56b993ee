//! Default collaborator implementations.

mod avatar;
pub mod labels;
mod markdown;
mod emoji;
mod shortlink;

pub use avatar::Gravatar;
pub use emoji::Shortcodes;
pub use labels::LabelTable;
pub use markdown::CommonMark;
pub use shortlink::StoreShortLinker;

use crate::traits::ViewCounter;

/// View counter for deployments without live viewing traffic.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoViews;

impl ViewCounter for NoViews {
    fn viewing(&self, _article_id: &str) -> Option<u32> {
        None
    }
}
