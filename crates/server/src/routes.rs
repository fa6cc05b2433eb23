use std::sync::Arc;

use axum::{
    routing::{get, post},
    Json, Router,
};
use sea_orm::DatabaseConnection;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;
use service::experts::repo::seaorm::{SeaOrmTokenRepository, SeaOrmUserRepository};
use service::experts::ExpertService;

pub mod auth;
pub mod experts;

/// Shared handler state: one service over the SeaORM repositories.
#[derive(Clone)]
pub struct ServerState {
    pub experts: Arc<ExpertService<SeaOrmUserRepository, SeaOrmTokenRepository>>,
}

impl ServerState {
    pub fn new(db: DatabaseConnection) -> Self {
        let users = Arc::new(SeaOrmUserRepository { db: db.clone() });
        let tokens = Arc::new(SeaOrmTokenRepository { db });
        Self { experts: Arc::new(ExpertService::new(users, tokens)) }
    }
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router
pub fn build_router(cors: CorsLayer, state: ServerState) -> Router {
    let public = Router::new().route("/health", get(health));

    let api = Router::new()
        .route("/experts", get(experts::search))
        .route("/experts/preview/random", get(experts::random_preview))
        .route("/experts/:id", get(experts::get_by_id))
        .route("/auth/register", post(auth::register))
        .route("/auth/verify", post(auth::verify));

    public
        .merge(api)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
