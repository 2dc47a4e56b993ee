use crate::config::PageSettings;
use crate::viewing::ViewingRegistry;
use axum::extract::FromRef;
use engine::ArticleService;

#[derive(Clone)]
pub struct AppState {
    pub service: ArticleService,
    pub viewing: ViewingRegistry,
    pub pages: PageSettings,
}

impl FromRef<AppState> for ViewingRegistry {
    fn from_ref(state: &AppState) -> Self {
        state.viewing.clone()
    }
}
