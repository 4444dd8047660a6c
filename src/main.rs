use mailchimp_member_sync::config::Config;
use mailchimp_member_sync::db::Database;
use mailchimp_member_sync::db_storage::{PgListStore, PgMemberStore};
use mailchimp_member_sync::handlers::{self, AppState};
use mailchimp_member_sync::mailchimp_client::MailChimpClient;
use mailchimp_member_sync::services::MemberService;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the application.
///
/// Initializes tracing, configuration, the Postgres pool and the MailChimp
/// client, then serves the member endpoints behind body-size and per-IP
/// rate limits.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailchimp_member_sync=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    let db = Database::new(&config.database_url, config.db_max_connections).await?;
    tracing::info!("Database connection pool established");

    let mailchimp = MailChimpClient::new(
        config.mailchimp_base_url.clone(),
        config.mailchimp_api_key.clone(),
        Duration::from_secs(config.mailchimp_timeout_secs),
    )?;
    tracing::info!("✓ MailChimp client initialized: {}", config.mailchimp_base_url);

    let app_state = Arc::new(AppState {
        members: MemberService::new(
            Arc::new(PgListStore::new(db.pool.clone())),
            Arc::new(PgMemberStore::new(db.pool.clone())),
            Arc::new(mailchimp),
        ),
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    let app = handlers::app(app_state)
        .layer(
            ServiceBuilder::new()
                .layer(RequestBodyLimitLayer::new(1024 * 1024))
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        )
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
