mod config;
mod http;
mod state;
mod viewing;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::Settings;
use engine::{providers::LabelTable, ArticleService, Collaborators, RelationMode};
use http::router::build_router;
use state::AppState;
use storage::{Db, DocumentStore};
use viewing::ViewingRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::new().context("Failed to load configuration")?;

    let db = Db::new(&settings.database.url).await?;
    let store: Arc<dyn DocumentStore> = Arc::new(db);

    let viewing = ViewingRegistry::new(256);
    let collab = Collaborators::with_defaults(store.clone(), &settings.forum)?
        .labels(Arc::new(LabelTable::new(settings.labels.clone())))
        .views(Arc::new(viewing.clone()));
    let service = ArticleService::new(store, collab, settings.forum.clone())
        .await
        .context("Failed to start article service")?;

    if settings.forum.relation_mode == RelationMode::Index && settings.forum.relation_refresh_secs > 0 {
        spawn_relation_refresh(
            service.clone(),
            Duration::from_secs(settings.forum.relation_refresh_secs),
        );
    }

    let state = AppState {
        service,
        viewing,
        pages: settings.pages.clone(),
    };

    let app = build_router(state, &settings.server.cors_origins);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address: {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn spawn_relation_refresh(service: ArticleService, period: Duration) {
    info!("Tag-article index refresh every {:?}", period);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // 第一次 tick 立即返回，启动时已经加载过
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = service.refresh_relations().await {
                error!("Tag-article index refresh failed: {:?}", e);
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}
