use std::sync::Arc;

use auth::Authenticator;
use identity_service::config::Config;
use identity_service::domain::identity::ports::IdentityRepository;
use identity_service::domain::identity::ports::IdentityServicePort;
use identity_service::domain::identity::ports::RoleRepository;
use identity_service::domain::identity::provisioning::provision;
use identity_service::domain::identity::service::IdentityService;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::repositories::InMemoryIdentityRepository;
use identity_service::outbound::repositories::InMemoryRoleRepository;
use identity_service::outbound::repositories::PostgresIdentityRepository;
use identity_service::outbound::repositories::PostgresRoleRepository;
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
        persistence = if config.database.url.is_some() { "postgresql" } else { "memory" },
        token_ttl_ms = config.jwt.expiration_ms,
        password_algorithm = ?config.password.algorithm,
        role_model = ?config.roles.model,
        "Configuration loaded"
    );

    let authenticator = Arc::new(Authenticator::with_hasher(
        &config.jwt.secret,
        chrono::Duration::milliseconds(config.jwt.expiration_ms),
        config.password.hasher(),
    )?);

    let identity_service: Arc<dyn IdentityServicePort> = match &config.database.url {
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

            build_service(
                &config,
                Arc::new(PostgresIdentityRepository::new(
                    pg_pool.clone(),
                    config.roles.model,
                )),
                Arc::new(PostgresRoleRepository::new(pg_pool)),
                Arc::clone(&authenticator),
            )
            .await?
        }
        None => {
            tracing::warn!("No database configured, identities are kept in memory");
            build_service(
                &config,
                Arc::new(InMemoryIdentityRepository::new()),
                Arc::new(InMemoryRoleRepository::new()),
                Arc::clone(&authenticator),
            )
            .await?
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

    let http_application = create_router(identity_service, authenticator, config.route_roles()?);

    if let Err(e) = axum::serve(http_listener, http_application).await {
        tracing::error!(error = %e, "Server error");
        return Err(e.into());
    }

    tracing::info!("Server exited successfully");
    Ok(())
}

/// Wire the identity service over the given stores and provision its roles.
async fn build_service<IR, RR>(
    config: &Config,
    identities: Arc<IR>,
    roles: Arc<RR>,
    authenticator: Arc<Authenticator>,
) -> Result<Arc<dyn IdentityServicePort>, anyhow::Error>
where
    IR: IdentityRepository,
    RR: RoleRepository,
{
    let service = Arc::new(IdentityService::new(
        identities,
        Arc::clone(&roles),
        authenticator,
        config.role_policy()?,
    ));

    let report = provision(roles.as_ref(), service.as_ref(), config.provisioning_plan()?).await?;
    tracing::info!(
        roles_created = report.roles_created,
        administrator_created = report.administrator_created,
        "Provisioning completed"
    );

    Ok(service)
}
