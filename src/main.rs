//! image-qc-gateway server entry point.
//!
//! Wires the stores, services and audit exporter, then starts the Axum
//! HTTP server.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use image_qc_gateway::api;
use image_qc_gateway::app_state::AppState;
use image_qc_gateway::config::{LogFormat, QcConfig};
use image_qc_gateway::domain::EventBus;
use image_qc_gateway::export::postgres::PgAuditSink;
use image_qc_gateway::export::{AuditExporter, RetryPolicy};
use image_qc_gateway::service::{CatalogService, ReviewService, RoleService};
use image_qc_gateway::store::postgres::{
    self, PgReviewStore, PgReviewerDirectory, PgSourceTable,
};
use image_qc_gateway::store::read_only::{ReadOnlyReviewStore, ViewerOnlyDirectory};
use image_qc_gateway::store::{ReviewStore, ReviewerDirectory, SourceTable};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = QcConfig::from_env().map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, "starting image-qc-gateway");

    // Build store layer
    let settings = config.pool_settings();
    let source_pool = postgres::connect_lazy(&config.source_database_url, settings)
        .context("invalid SOURCE_DATABASE_URL")?;
    let source: Arc<dyn SourceTable> =
        Arc::new(PgSourceTable::new(source_pool, config.source_table.clone())?);

    let (reviews, directory): (Arc<dyn ReviewStore>, Arc<dyn ReviewerDirectory>) =
        match &config.review_database_url {
            Some(url) => {
                let pool = postgres::connect_lazy(url, settings)
                    .context("invalid REVIEW_DATABASE_URL")?;
                if config.review_store_migrate {
                    postgres::migrate(&pool).await?;
                    tracing::info!("review store migrations applied");
                }
                let reviews: Arc<dyn ReviewStore> = Arc::new(PgReviewStore::new(pool.clone()));
                let directory: Arc<dyn ReviewerDirectory> =
                    Arc::new(PgReviewerDirectory::new(pool));
                (reviews, directory)
            }
            None => {
                tracing::warn!("REVIEW_DATABASE_URL not set; running read-only");
                let reviews: Arc<dyn ReviewStore> = Arc::new(ReadOnlyReviewStore);
                let directory: Arc<dyn ReviewerDirectory> = Arc::new(ViewerOnlyDirectory);
                (reviews, directory)
            }
        };

    // Build domain and service layer
    let event_bus = EventBus::new(config.event_bus_capacity);
    let roles = Arc::new(RoleService::new(
        directory,
        Duration::from_secs(config.role_cache_ttl_secs),
    ));
    let catalog = Arc::new(CatalogService::new(source, Arc::clone(&reviews)));
    let review_service = Arc::new(ReviewService::new(
        reviews,
        Arc::clone(&roles),
        event_bus.clone(),
    ));

    // Start audit exporter
    if config.audit_export_enabled {
        let pool = postgres::connect_lazy(&config.audit_export_database_url, settings)
            .context("invalid AUDIT_EXPORT_DATABASE_URL")?;
        let sink = Arc::new(PgAuditSink::new(pool, &config.audit_export_table)?);
        let _exporter = AuditExporter::new(
            sink,
            config.audit_export_source.clone(),
            RetryPolicy::default(),
        )
        .spawn(&event_bus);
        tracing::info!(table = %config.audit_export_table, "audit export enabled");
    }

    // Build application state
    let app_state = AppState {
        catalog,
        reviews: review_service,
        roles,
        default_page_size: config.page_size,
        max_page_size: config.max_page_size,
    };

    // Build router
    let app = api::build_app(
        app_state,
        &config.cors_origins,
        Duration::from_secs(config.request_timeout_secs),
    );

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
