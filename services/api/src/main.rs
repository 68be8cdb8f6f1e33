use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

mod email;
mod error;
mod invitation;
mod jwt;
mod middleware;
mod models;
mod repositories;
mod role_context;
mod routes;
mod session;
mod storage;
mod validation;

use common::cache::RedisPool;
use sqlx::PgPool;

use crate::email::Mailer;
use crate::invitation::InvitationService;
use crate::jwt::JwtService;
use crate::repositories::{
    NomineeRepository, NotificationRepository, RecordRepository, RequestRepository,
    RoleRepository, TrusteeRepository, UserRepository,
};
use crate::role_context::RoleContext;
use crate::session::SessionManager;
use crate::storage::ObjectStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub redis_pool: RedisPool,
    pub jwt_service: JwtService,
    pub session_manager: SessionManager,
    pub users: UserRepository,
    pub nominees: NomineeRepository,
    pub trustees: TrusteeRepository,
    pub notifications: NotificationRepository,
    pub records: RecordRepository,
    pub requests: RequestRepository,
    pub invitations: InvitationService,
    pub role_context: RoleContext,
    pub storage: ObjectStore,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_max_level(Level::INFO)
        .init();

    info!("Starting Legacy Keeper API service");

    // Initialize database connection pool and run migrations
    let db_config = common::database::DatabaseConfig::from_env()?;
    let pool = common::database::init_pool(&db_config).await?;

    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| common::error::DatabaseError::Migration(e.to_string()))?;

    // Initialize Redis connection pool
    let redis_config = common::cache::RedisConfig::from_env()?;
    let redis_pool = RedisPool::new(&redis_config).await?;

    // Initialize JWT service and session manager
    let jwt_config = jwt::JwtConfig::from_env()?;
    let jwt_service = JwtService::new(jwt_config)?;
    let session_manager = SessionManager::new(redis_pool.clone(), jwt_service.clone());

    // Object storage and the log-only mailer
    let storage = ObjectStore::from_env().await;
    let mailer = Mailer::from_env();

    // Repositories
    let users = UserRepository::new(pool.clone());
    let nominees = NomineeRepository::new(pool.clone());
    let trustees = TrusteeRepository::new(pool.clone());
    let notifications = NotificationRepository::new(pool.clone());
    let records = RecordRepository::new(pool.clone());
    let requests = RequestRepository::new(pool.clone());
    let roles = RoleRepository::new(pool.clone());

    // Core services
    let invitations = InvitationService::new(
        nominees.clone(),
        trustees.clone(),
        notifications.clone(),
        roles.clone(),
        users.clone(),
        mailer,
    );
    let role_context = RoleContext::new(
        roles,
        nominees.clone(),
        users.clone(),
        session_manager.clone(),
    );

    let app_state = AppState {
        db_pool: pool,
        redis_pool,
        jwt_service,
        session_manager,
        users,
        nominees,
        trustees,
        notifications,
        records,
        requests,
        invitations,
        role_context,
        storage,
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Legacy Keeper API listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
