use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use auth::TokenCodec;
use identity_service::config::Config;
use identity_service::domain::identity::ports::CredentialStore;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::repositories::InMemoryCredentialStore;
use identity_service::outbound::repositories::PostgresCredentialStore;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "identity-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        database = config.database.is_some(),
        token_ttl_minutes = ?config.jwt.expiration_minutes,
        store_timeout_secs = config.store.timeout_secs,
        "Configuration loaded"
    );

    let token_codec = TokenCodec::new(config.jwt.secret.as_bytes())?;
    let password_hasher = config.password.build_hasher()?;
    let authenticator = Arc::new(Authenticator::new(
        password_hasher,
        token_codec,
        config.jwt.token_ttl(),
    )?);

    match &config.database {
        Some(database) => {
            let pg_pool = PgPoolOptions::new()
                .max_connections(database.max_connections)
                .acquire_timeout(database.acquire_timeout())
                .connect(&database.url)
                .await?;
            tracing::info!(
                max_connections = database.max_connections,
                database = "postgresql",
                "Database connection pool created"
            );

            sqlx::migrate!("./migrations").run(&pg_pool).await?;
            tracing::info!(database = "postgresql", "Database migrations completed");

            let store = Arc::new(PostgresCredentialStore::new(pg_pool));
            serve(&config, store, authenticator).await
        }
        None => {
            tracing::warn!("No database configured, identities are kept in memory");
            let store = Arc::new(InMemoryCredentialStore::new());
            serve(&config, store, authenticator).await
        }
    }
}

async fn serve<S: CredentialStore>(
    config: &Config,
    store: Arc<S>,
    authenticator: Arc<Authenticator>,
) -> Result<(), anyhow::Error> {
    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let store_timeout: Duration = config.store.timeout();
    let http_application = create_router(store, authenticator, store_timeout);

    axum::serve(http_listener, http_application).await?;
    tracing::info!("Server exited successfully");

    Ok(())
}
