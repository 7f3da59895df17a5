use std::sync::Arc;

use account_service::account::ports::AuthServicePort;
use account_service::account::service::AuthService;
use account_service::config::Config;
use account_service::inbound::http::router::create_router;
use account_service::repositories::InMemoryAccountRepository;
use account_service::repositories::PostgresAccountRepository;
use auth::Authenticator;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "account_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "account-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        persistent = config.database.url.is_some(),
        access_ttl_seconds = config.tokens.access_ttl_seconds,
        refresh_ttl_seconds = config.tokens.refresh_ttl_seconds,
        "Configuration loaded"
    );

    let authenticator = Arc::new(Authenticator::new(
        config.tokens.access_secret.as_bytes(),
        config.tokens.refresh_secret.as_bytes(),
        config.tokens.lifetimes(),
    ));

    let auth_service: Arc<dyn AuthServicePort> = match &config.database.url {
        Some(url) => {
            let pg_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .connect(url)
                .await?;
            tracing::info!(
                max_connections = config.database.max_connections,
                database = "postgresql",
                "Database connection pool created"
            );

            sqlx::migrate!("./migrations").run(&pg_pool).await?;
            tracing::info!(database = "postgresql", "Database migrations completed");

            let repository = Arc::new(PostgresAccountRepository::new(pg_pool));
            Arc::new(AuthService::new(repository, authenticator))
        }
        None => {
            tracing::warn!("No database configured, accounts are kept in memory only");
            let repository = Arc::new(InMemoryAccountRepository::new());
            Arc::new(AuthService::new(repository, authenticator))
        }
    };

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(auth_service);
    axum::serve(http_listener, http_application).await?;

    tracing::info!("Server exited");

    Ok(())
}
