use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
};
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::{AppConfig, AuthConfig},
    database,
    error::{AppError, Result},
    routes,
    services::storage_service::{self, SharedStorage},
};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub storage: SharedStorage,
    pub assets_url: String,
    pub public_base_url: String,
    pub auth: AuthConfig,
}

pub async fn build(config: &AppConfig) -> Result<Router> {
    let pool = database::create_pool(&config.database).await?;

    if let Some(ref admin) = config.auth.bootstrap_admin {
        database::bootstrap_admin(&pool, admin).await?;
    }

    let storage = storage_service::build_storage(&config.storage).await?;

    let state = AppState {
        db: pool,
        storage,
        assets_url: config.storage.assets_url.clone(),
        public_base_url: config.public_base_url.clone(),
        auth: config.auth.clone(),
    };

    let allowed_origins: Vec<HeaderValue> = config
        .cors
        .allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|_| AppError::ConfigError(format!("Invalid CORS origin: {}", origin)))
        })
        .collect::<Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
        .allow_credentials(true)
        .allow_origin(allowed_origins);

    let app = routes::create_router(state)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(app)
}
