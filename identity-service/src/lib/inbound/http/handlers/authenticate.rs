use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::TokenResponseData;
use super::INVALID_CREDENTIALS;
use crate::domain::identity::models::AuthenticateCommand;
use crate::domain::identity::models::Username;
use crate::domain::identity::ports::AuthServicePort;
use crate::domain::identity::ports::CredentialStore;
use crate::identity::errors::AuthError;
use crate::inbound::http::router::AppState;

pub async fn authenticate<S: CredentialStore>(
    State(state): State<AppState<S>>,
    Json(body): Json<AuthenticateRequestBody>,
) -> Result<ApiSuccess<TokenResponseData>, ApiError> {
    // A username that could never have been registered is just a failed login.
    let username = Username::new(body.username)
        .map_err(|_| ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    let token = state
        .auth_service
        .authenticate(AuthenticateCommand::new(username, body.password))
        .await
        .map_err(|e| {
            if let AuthError::UserNotFound(_) | AuthError::InvalidCredentials = e {
                tracing::info!(reason = %e, "Login rejected");
            }
            ApiError::from(e)
        })?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        TokenResponseData {
            token: token.into_inner(),
        },
    ))
}

#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct AuthenticateRequestBody {
    username: String,
    password: String,
}
