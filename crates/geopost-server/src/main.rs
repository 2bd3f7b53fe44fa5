mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use geopost_api::posts::PostWriter;
use geopost_api::search::GeoSearch;
use geopost_api::token::TokenAuthority;
use geopost_api::users::UserStore;
use geopost_api::{AppState, AppStateInner, bootstrap};
use geopost_store::{
    AuditStore, BigtableAuditStore, ElasticIndex, GcsObjectStore, LocalObjectStore, MemoryIndex,
    ObjectStore, SearchIndex, SqliteAuditStore,
};

use crate::config::{AuditBackend, Config, ObjectBackend, SearchBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "geopost_server=debug,geopost_api=debug,geopost_store=debug,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;
    let http = reqwest::Client::new();

    let index: Arc<dyn SearchIndex> = match &config.search {
        SearchBackend::Elasticsearch { url } => Arc::new(ElasticIndex::new(http.clone(), url)),
        SearchBackend::Memory => Arc::new(MemoryIndex::new()),
    };
    bootstrap::ensure_indices(index.as_ref()).await?;

    // Local objects are served by this process under /media.
    let mut media_dir = None;
    let objects: Arc<dyn ObjectStore> = match &config.objects {
        ObjectBackend::Gcs { endpoint, bucket } => Arc::new(GcsObjectStore::new(
            http.clone(),
            endpoint,
            bucket,
            config.gcp_access_token.clone(),
        )),
        ObjectBackend::Local {
            dir,
            public_base_url,
        } => {
            let store = LocalObjectStore::new(dir.clone(), public_base_url).await?;
            media_dir = Some(store.public_dir());
            Arc::new(store)
        }
    };
    objects.check_bucket().await?;

    let audit: Arc<dyn AuditStore> = match &config.audit {
        AuditBackend::Bigtable {
            endpoint,
            project,
            instance,
        } => Arc::new(BigtableAuditStore::new(
            http.clone(),
            endpoint,
            project,
            instance,
            config.gcp_access_token.clone(),
        )),
        AuditBackend::Sqlite { path } => Arc::new(SqliteAuditStore::open(path)?),
    };

    let state: AppState = Arc::new(AppStateInner {
        users: UserStore::new(index.clone()),
        posts: PostWriter::new(index.clone(), objects, audit),
        search: GeoSearch::new(index),
        tokens: TokenAuthority::new(
            config.jwt_secret.as_bytes(),
            chrono::Duration::hours(config.token_ttl_hours),
        ),
    });

    let mut app: Router = geopost_api::app(state, config.max_image_bytes);
    if let Some(dir) = media_dir {
        app = app.nest_service("/media", ServeDir::new(dir));
    }
    let app = app.layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Geopost server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
