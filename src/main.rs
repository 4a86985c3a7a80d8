//! Driftmarket Backend Server
//!
//! Authentication service for the Driftmarket NFT marketplace: wallet
//! (challenge/signature) sign-in, email/password sign-in, and the JWT
//! access/refresh/reset/verify token lifecycle.

use axum::http::{HeaderValue, Method};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use driftmarket_backend::auth::{AuthService, ThreadRngNonceSource};
use driftmarket_backend::config::Config;
use driftmarket_backend::db;
use driftmarket_backend::routes::{auth_routes, health_routes};
use driftmarket_backend::services::EmailService;
use driftmarket_backend::state::AppState;
use driftmarket_backend::tokens::{PgTokenStore, TokenService, TokenTtls};
use driftmarket_backend::users::UserService;

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .init();

    tracing::info!(environment = %config.environment.as_str(), "Starting Driftmarket backend");

    if config.environment.is_production()
        && config.jwt_secret == "development-secret-change-in-production"
    {
        tracing::error!("JWT_SECRET must be set in production");
        std::process::exit(1);
    }

    // Database pool and migrations
    let db_pool = match db::create_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to database");
            std::process::exit(1);
        }
    };
    if let Err(e) = db::run_migrations(&db_pool).await {
        tracing::error!(error = %e, "Failed to run migrations");
        std::process::exit(1);
    }

    // Wire up services
    let user_service = UserService::new(db_pool.clone(), Arc::new(ThreadRngNonceSource));
    let token_service = TokenService::new(
        Arc::new(PgTokenStore::new(db_pool.clone())),
        config.jwt_secret.clone(),
        TokenTtls {
            access_minutes: config.jwt_access_ttl_minutes,
            refresh_days: config.jwt_refresh_ttl_days,
            reset_password_minutes: config.jwt_reset_password_ttl_minutes,
            verify_email_minutes: config.jwt_verify_email_ttl_minutes,
        },
    );
    let mailer = EmailService::new(config.frontend_url.clone());
    let auth_service = Arc::new(AuthService::new(user_service, token_service, mailer));

    let app_state = AppState::new(auth_service, db_pool);

    // CORS: explicit origins when configured, permissive otherwise
    let cors = match &config.cors_allowed_origins {
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(Any)
        }
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any),
    };

    let app = Router::new()
        .merge(health_routes())
        .merge(auth_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(error = %e, "Failed to bind {}", addr);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "Server exited with error");
        std::process::exit(1);
    }
}
