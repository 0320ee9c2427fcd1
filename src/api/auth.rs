//! Admin verification endpoint.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::{success, ApiResult};
use crate::auth;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct VerifyPasswordRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyPasswordResponse {
    pub authenticated: bool,
}

/// POST /api/auth/verify - Check the admin password.
///
/// Succeeding here issues nothing: the client flips its own admin flag, which
/// is the authorization model this deployment ships with.
pub async fn verify_password(
    State(state): State<AppState>,
    Json(request): Json<VerifyPasswordRequest>,
) -> ApiResult<VerifyPasswordResponse> {
    auth::verify_admin_password(state.config.admin_password.as_deref(), &request.password)?;
    success(VerifyPasswordResponse {
        authenticated: true,
    })
}
