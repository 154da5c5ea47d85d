use actix_web::{web, App, HttpResponse, HttpServer};
use anyhow::{Context, Result};
use engagement_service::config::StoreBackend;
use engagement_service::db::{pg_store::MIGRATOR, EntityStore, MemoryEntityStore, PgEntityStore};
use engagement_service::handlers;
use engagement_service::services::EngagementService;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct HealthState {
    db_pool: Option<sqlx::PgPool>,
}

impl HealthState {
    async fn check_postgres(&self) -> Result<(), sqlx::Error> {
        match &self.db_pool {
            Some(pool) => sqlx::query("SELECT 1").fetch_one(pool).await.map(|_| ()),
            None => Ok(()),
        }
    }
}

async fn health_summary(state: web::Data<HealthState>) -> HttpResponse {
    match state.check_postgres().await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "engagement-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("PostgreSQL connection failed: {}", e),
            "service": "engagement-service"
        })),
    }
}

async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Engagement Service
///
/// Votes, popularity scoring, threaded discussions, ranked feeds and the
/// bloggers dashboard.
///
/// # Routes
///
/// - `/api/v1/feed`, `/api/v1/authors/{id}/posts` - ranked feeds
/// - `/api/v1/posts/*` - post detail, edit, delete, reactions
/// - `/api/v1/votes`, `/api/v1/comments/*` - voting and discussion
/// - `/api/v1/dashboard` - counts and leaderboards
///
/// Runs on port 8085 (configurable via ENGAGEMENT_SERVICE_PORT).
#[actix_web::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = engagement_service::Config::from_env()
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to load configuration")?;

    tracing::info!("Starting engagement-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let (store, db_pool): (Arc<dyn EntityStore>, Option<sqlx::PgPool>) =
        match config.engagement.store {
            StoreBackend::Postgres => {
                let pool = PgPoolOptions::new()
                    .max_connections(config.database.max_connections)
                    .min_connections(config.database.min_connections)
                    .acquire_timeout(Duration::from_secs(config.database.connect_timeout_secs))
                    .connect(&config.database.url)
                    .await
                    .context("Failed to connect to database")?;
                tracing::info!("✅ Database pool created");

                MIGRATOR
                    .run(&pool)
                    .await
                    .context("Failed to run database migrations")?;
                tracing::info!("✅ Database migrations completed");

                (Arc::new(PgEntityStore::new(pool.clone())), Some(pool))
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory entity store; data is lost on restart");
                (Arc::new(MemoryEntityStore::new()), None)
            }
        };

    let engagement = web::Data::new(EngagementService::new(store, &config.engagement));
    let health_state = web::Data::new(HealthState { db_pool });

    let http_bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", http_bind_address);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(engagement.clone())
            .app_data(health_state.clone())
            .wrap(tracing_actix_web::TracingLogger::default())
            .route(
                "/metrics",
                web::get().to(engagement_service::metrics::serve_metrics),
            )
            // Health check endpoints
            .route("/api/v1/health", web::get().to(health_summary))
            .route("/api/v1/health/live", web::get().to(liveness_check))
            .configure(handlers::configure_routes)
    })
    .bind(&http_bind_address)
    .with_context(|| format!("Failed to bind {}", http_bind_address))?
    .run();

    let server_handle = server.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, stopping HTTP server");
        server_handle.stop(true).await;
    });

    server.await.context("HTTP server failed")?;
    tracing::info!("engagement-service stopped");
    Ok(())
}
