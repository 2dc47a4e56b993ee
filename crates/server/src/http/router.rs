use super::handlers::{articles, channel};
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

fn cors_layer(allowed_origins: &str) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_headers(Any);
    if allowed_origins == "*" {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!("CORS config is invalid or empty, falling back to allow ANY.");
        base.allow_origin(Any)
    } else {
        tracing::info!("CORS enabled for origins: {:?}", origins);
        base.allow_origin(origins)
    }
}

pub fn build_router(state: AppState, allowed_origins: &str) -> Router {
    Router::new()
        .route("/api/recent", get(articles::recent))
        .route("/api/hot", get(articles::hot))
        .route("/api/top", get(articles::top))
        .route("/api/random", get(articles::random))
        .route("/api/tags/:title/articles", get(articles::by_tag))
        .route("/api/cities/:city/articles", get(articles::by_city))
        .route("/api/articles", get(articles::list))
        .route("/api/articles/:id", get(articles::article))
        .route("/api/articles/:id/relevant", get(articles::relevant))
        .route("/api/articles/:id/channel", get(channel::heat_channel))
        .route("/api/users/:id/articles", get(articles::user_articles))
        .route("/api/broadcasts", get(articles::broadcasts))
        .route("/api/news", get(articles::news))
        .route("/api/interests", get(articles::interests))
        .route("/api/stories", get(articles::stories))
        .route("/api/stories/top", get(articles::top_stories))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
