use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use domain::{Article, Pagination};
use engine::{
    ArticleListRequest, ArticleListing, AssembledArticle, RenderedArticle, ServiceError, Story,
};
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;

use crate::http::params::{resolve_viewer, ListParams};
use crate::state::AppState;

type ApiError = (StatusCode, String);

fn internal(e: ServiceError) -> ApiError {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

fn not_found(what: String) -> ApiError {
    (StatusCode::NOT_FOUND, format!("{} not found", what))
}

/// Data of the recent page: one page of latest articles plus side lists.
#[derive(Serialize)]
pub struct RecentPage {
    pub articles: Vec<AssembledArticle>,
    pub pagination: Pagination,
    pub random_articles: Vec<AssembledArticle>,
    pub hot_articles: Vec<AssembledArticle>,
}

pub async fn recent(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<RecentPage>, ApiError> {
    let page = params.page();
    let size = state.pages.recent_page_size;
    let service = &state.service;

    let articles = service.recent_articles(page, size).await.map_err(internal)?;
    let total = service.recent_article_count().await.map_err(internal)?;
    let pagination = Pagination::new(page, size, total, state.pages.recent_window_size);
    let random_articles = service
        .random_articles(state.pages.random_size)
        .await
        .map_err(internal)?;
    let hot_articles = service
        .hot_articles(state.pages.hot_size)
        .await
        .map_err(internal)?;

    Ok(Json(RecentPage {
        articles,
        pagination,
        random_articles,
        hot_articles,
    }))
}

pub async fn hot(State(state): State<AppState>) -> Result<Json<Vec<AssembledArticle>>, ApiError> {
    let articles = state
        .service
        .hot_articles(state.pages.hot_size)
        .await
        .map_err(internal)?;
    Ok(Json(articles))
}

pub async fn top(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<AssembledArticle>>, ApiError> {
    let articles = state
        .service
        .top_articles(params.page(), state.pages.top_page_size)
        .await
        .map_err(internal)?;
    Ok(Json(articles))
}

pub async fn random(State(state): State<AppState>) -> Result<Json<Vec<AssembledArticle>>, ApiError> {
    let articles = state
        .service
        .random_articles(state.pages.random_size)
        .await
        .map_err(internal)?;
    Ok(Json(articles))
}

pub async fn by_tag(
    State(state): State<AppState>,
    Path(title): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<AssembledArticle>>, ApiError> {
    let tag = state
        .service
        .tag_by_title(&title)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(format!("Tag [{}]", title)))?;
    let articles = state
        .service
        .articles_by_tag(&tag, params.page(), state.pages.tag_page_size)
        .await
        .map_err(internal)?;
    Ok(Json(articles))
}

pub async fn by_city(
    State(state): State<AppState>,
    Path(city): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<AssembledArticle>>, ApiError> {
    let articles = state
        .service
        .articles_by_city(&city, params.page(), state.pages.city_page_size)
        .await
        .map_err(internal)?;
    Ok(Json(articles))
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ArticleListing>, ApiError> {
    let pages = &state.pages;
    let request = ArticleListRequest {
        page: params.page(),
        page_size: params.size(pages.list_page_size, pages.max_page_size),
        window_size: params.window(pages.list_window_size),
        id: params.id.clone().filter(|id| !id.is_empty()),
    };
    let listing = state.service.list_articles(&request).await.map_err(internal)?;
    Ok(Json(listing))
}

pub async fn article(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<RenderedArticle>, ApiError> {
    let assembled = state
        .service
        .article_by_id(&id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(format!("Article [{}]", id)))?;
    let viewer = resolve_viewer(&state, &headers).await?;

    let rendered = state
        .service
        .process_article_content(assembled, viewer.as_ref())
        .await
        .map_err(internal)?;
    Ok(Json(rendered))
}

pub async fn relevant(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<AssembledArticle>>, ApiError> {
    let article = state
        .service
        .article(&id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(format!("Article [{}]", id)))?;

    let mut rng = StdRng::from_entropy();
    let articles = state
        .service
        .relevant_articles(&article, state.pages.relevant_size, &mut rng)
        .await
        .map_err(internal)?;
    Ok(Json(articles))
}

pub async fn user_articles(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<AssembledArticle>>, ApiError> {
    let articles = state
        .service
        .user_articles(&user_id, params.page(), state.pages.user_page_size)
        .await
        .map_err(internal)?;
    Ok(Json(articles))
}

pub async fn broadcasts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Article>>, ApiError> {
    let articles = state
        .service
        .broadcasts(params.page(), state.pages.broadcast_page_size)
        .await
        .map_err(internal)?;
    Ok(Json(articles))
}

pub async fn news(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Article>>, ApiError> {
    let articles = state
        .service
        .news(params.page(), state.pages.news_page_size)
        .await
        .map_err(internal)?;
    Ok(Json(articles))
}

pub async fn interests(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Article>>, ApiError> {
    let articles = state
        .service
        .interests(
            params.page(),
            state.pages.interest_page_size,
            &params.tag_titles(),
        )
        .await
        .map_err(internal)?;
    Ok(Json(articles))
}

pub async fn stories(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Story>>, ApiError> {
    let stories = state
        .service
        .recent_stories(params.page(), state.pages.story_page_size)
        .await
        .map_err(internal)?;
    Ok(Json(stories))
}

pub async fn top_stories(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Story>>, ApiError> {
    let stories = state
        .service
        .top_stories(params.page(), state.pages.story_page_size)
        .await
        .map_err(internal)?;
    Ok(Json(stories))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PageSettings;
    use crate::http::params::VIEWER_HEADER;
    use crate::viewing::ViewingRegistry;
    use engine::{ArticleService, Collaborators, QueryConfig, Visibility};
    use serde_json::json;
    use std::sync::Arc;
    use storage::{Collection, DocumentStore, MemoryStore};

    async fn state() -> AppState {
        let store = MemoryStore::new();
        for user in [
            json!({ "id": "u1", "email": "x@example.com", "name": "x" }),
            json!({ "id": "u2", "email": "ann@example.com", "name": "ann" }),
            json!({ "id": "u3", "email": "carol@example.com", "name": "carol" }),
        ] {
            store.put(Collection::Users, user).await.unwrap();
        }
        store
            .put(
                Collection::Articles,
                json!({
                    "id": "1700000000000", "title": "plans", "article_type": "discussion",
                    "status": "valid", "author_email": "x@example.com", "author_id": "u1",
                    "content": "only for @ann", "permalink": "/article/1700000000000",
                }),
            )
            .await
            .unwrap();

        let store: Arc<dyn DocumentStore> = Arc::new(store);
        let config = QueryConfig {
            serve_path: "https://forum.example".to_string(),
            ..Default::default()
        };
        let viewing = ViewingRegistry::new(16);
        let collab = Collaborators::with_defaults(store.clone(), &config)
            .unwrap()
            .views(Arc::new(viewing.clone()));
        let service = ArticleService::new(store, collab, config).await.unwrap();
        AppState {
            service,
            viewing,
            pages: PageSettings::default(),
        }
    }

    fn as_user(name: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(VIEWER_HEADER, name.parse().unwrap());
        headers
    }

    #[tokio::test]
    async fn discussion_visibility_follows_the_viewer() {
        let state = state().await;
        let id = "1700000000000".to_string();

        let Json(for_ann) = article(State(state.clone()), Path(id.clone()), as_user("ann"))
            .await
            .unwrap();
        assert_eq!(for_ann.visibility, Visibility::Open);
        assert!(for_ann.discussion_viewable);

        let Json(for_carol) = article(State(state.clone()), Path(id.clone()), as_user("carol"))
            .await
            .unwrap();
        assert!(!for_carol.discussion_viewable);

        let Json(anonymous) = article(State(state), Path(id), HeaderMap::new())
            .await
            .unwrap();
        assert!(!anonymous.discussion_viewable);
    }

    #[tokio::test]
    async fn heat_reflects_open_readers() {
        let state = state().await;
        let _reader = state.viewing.enter("1700000000000");

        let Json(a) = article(
            State(state.clone()),
            Path("1700000000000".to_string()),
            as_user("x"),
        )
        .await
        .unwrap();
        assert_eq!(a.assembled.heat, 1);
    }

    #[tokio::test]
    async fn unknown_article_is_404() {
        let state = state().await;
        let err = article(State(state.clone()), Path("nope".to_string()), HeaderMap::new())
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);

        let err = relevant(State(state.clone()), Path("nope".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);

        let err = by_tag(State(state), Path("nope".to_string()), Query(ListParams::default()))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn recent_page_normalizes_bad_page_numbers() {
        let state = state().await;
        let params = ListParams {
            p: Some("garbage".to_string()),
            ..Default::default()
        };
        let Json(page) = recent(State(state), Query(params)).await.unwrap();
        assert_eq!(page.pagination.current_page_num, 1);
        // 讨论帖不进入最新列表
        assert!(page.articles.is_empty());
        assert_eq!(page.pagination.page_count, 0);
    }

    #[tokio::test]
    async fn huge_page_numbers_are_served_empty() {
        let state = state().await;
        let params = || ListParams {
            p: Some("1000000000000000000".to_string()),
            ..Default::default()
        };
        let Json(page) = recent(State(state.clone()), Query(params())).await.unwrap();
        assert!(page.articles.is_empty());
        assert_eq!(page.pagination.current_page_num, 1_000_000_000_000_000_000);

        let Json(top) = top(State(state.clone()), Query(params())).await.unwrap();
        assert!(top.is_empty());
        let Json(stories) = top_stories(State(state), Query(params())).await.unwrap();
        assert!(stories.is_empty());
    }
}
