use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use service::experts::domain::SignUpRequest;
use service::experts::errors::ExpertError;

use super::ServerState;
use crate::errors::ApiError;

#[derive(Serialize)]
pub struct RegisterOutput {
    pub user_id: Uuid,
    // TODO: deliver the token by email once a mailer exists; until then the
    // response carries it so the verify flow is usable.
    pub verification_token: String,
}

#[derive(Deserialize)]
pub struct VerifyInput {
    pub token: String,
}

pub async fn register(
    State(state): State<ServerState>,
    Json(input): Json<SignUpRequest>,
) -> Result<Json<RegisterOutput>, ApiError> {
    let user = state.experts.register(input).await?;

    let token = Uuid::new_v4().to_string();
    state.experts.create_verification_token(user.id, &token).await?;

    Ok(Json(RegisterOutput { user_id: user.id, verification_token: token }))
}

pub async fn verify(
    State(state): State<ServerState>,
    Json(input): Json<VerifyInput>,
) -> Result<StatusCode, ApiError> {
    // One-time token: consumed here, so replaying it fails with not-found.
    let stored = state
        .experts
        .consume_verification_token(&input.token)
        .await?
        .ok_or_else(|| ApiError(ExpertError::NotFound("verification token not found".into())))?;

    state.experts.set_enabled(stored.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
