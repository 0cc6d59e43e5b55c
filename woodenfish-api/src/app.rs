/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use woodenfish_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = woodenfish_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer, routes};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /                                   # Service info
/// ├── GET  /health                             # Health check
/// ├── /users/
/// │   ├── POST /register
/// │   ├── POST /send-code
/// │   ├── POST /login
/// │   └── GET  /:user_id
/// ├── GET  /stats/:user_id
/// ├── /meditation/
/// │   ├── POST /:user_id/sessions
/// │   └── GET  /:user_id/sessions?limit=
/// ├── /achievements/
/// │   ├── GET  /
/// │   ├── POST /:user_id/unlock/:achievement_id
/// │   └── GET  /:user_id/user
/// ├── GET  /leaderboard/:period?limit=
/// └── /share/
///     ├── GET  /tasks
///     ├── POST /:user_id/complete/:task_id
///     └── GET  /:user_id/user
/// ```
///
/// # Middleware Stack
///
/// Applied in order (innermost first):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
pub fn build_router(state: AppState) -> Router {
    let info_routes = Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check));

    let user_routes = Router::new()
        .route("/register", post(routes::users::register))
        .route("/send-code", post(routes::users::send_code))
        .route("/login", post(routes::users::login))
        .route("/:user_id", get(routes::users::get_user));

    let stats_routes = Router::new().route("/:user_id", get(routes::stats::get_stats));

    let meditation_routes = Router::new().route(
        "/:user_id/sessions",
        post(routes::meditation::create_session).get(routes::meditation::list_sessions),
    );

    let achievement_routes = Router::new()
        .route("/", get(routes::achievements::list_achievements))
        .route(
            "/:user_id/unlock/:achievement_id",
            post(routes::achievements::unlock_achievement),
        )
        .route("/:user_id/user", get(routes::achievements::list_user_achievements));

    let leaderboard_routes =
        Router::new().route("/:period", get(routes::leaderboard::get_leaderboard));

    let share_routes = Router::new()
        .route("/tasks", get(routes::share::list_tasks))
        .route("/:user_id/complete/:task_id", post(routes::share::complete_task))
        .route("/:user_id/user", get(routes::share::list_user_tasks));

    let cors = cors_layer(&state.config);
    let production = state.config.api.production;

    Router::new()
        .merge(info_routes)
        .nest("/users", user_routes)
        .nest("/stats", stats_routes)
        .nest("/meditation", meditation_routes)
        .nest("/achievements", achievement_routes)
        // mobile clients request the catalog with a trailing slash
        .route("/achievements/", get(routes::achievements::list_achievements))
        .nest("/leaderboard", leaderboard_routes)
        .nest("/share", share_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(production))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
