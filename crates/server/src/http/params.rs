use axum::http::{HeaderMap, StatusCode};
use domain::Viewer;
use serde::Deserialize;

use crate::state::AppState;

/// Header carrying the name of the signed-in user, set by the auth proxy.
pub const VIEWER_HEADER: &str = "x-forum-user";

/// Raw listing query. Values stay strings so malformed numbers fall back to
/// defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub p: Option<String>,
    pub size: Option<String>,
    pub window: Option<String>,
    pub id: Option<String>,
    pub tags: Option<String>,
}

fn positive(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
}

impl ListParams {
    /// 1-based page; anything unparsable or zero is page 1.
    pub fn page(&self) -> usize {
        positive(self.p.as_deref()).unwrap_or(1)
    }

    pub fn size(&self, default: usize, max: usize) -> usize {
        positive(self.size.as_deref()).unwrap_or(default).min(max)
    }

    pub fn window(&self, default: usize) -> usize {
        positive(self.window.as_deref()).unwrap_or(default)
    }

    pub fn tag_titles(&self) -> Vec<&str> {
        self.tags
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// Resolves the viewer from [`VIEWER_HEADER`]. Unknown names are anonymous.
pub async fn resolve_viewer(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<Viewer>, (StatusCode, String)> {
    let Some(name) = headers
        .get(VIEWER_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
    else {
        return Ok(None);
    };

    let user = state
        .service
        .user_by_name(name)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(user.as_ref().map(Viewer::from))
}
