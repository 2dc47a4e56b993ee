use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tracing::{error, info};

use crate::viewing::ViewingRegistry;

/// Holds the caller as a reader of the article for as long as the stream is
/// open and pushes `heat` events for that article.
pub async fn heat_channel(
    State(viewing): State<ViewingRegistry>,
    Path(article_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let rx = viewing.subscribe();
    let reader = viewing.enter(&article_id);
    info!("Heat channel opened: article={}", article_id);

    let stream = BroadcastStream::new(rx).filter_map(move |result| {
        // 流被丢弃时 reader 随之释放，热度减一
        let _reader = &reader;
        match result {
            Ok(event) if event.article_id == article_id => Some(
                Event::default()
                    .event("heat")
                    .json_data(&event)
                    .map_err(|e| {
                        error!("SSE serialization error: {}", e);
                        e
                    }),
            ),
            _ => None,
        }
    });
    Sse::new(stream).keep_alive(KeepAlive::new().interval(std::time::Duration::from_secs(15)))
}
