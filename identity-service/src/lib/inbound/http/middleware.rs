use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::extract::Request;
use axum::extract::State;
use axum::http::request::Parts;
use axum::http::{self};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;

use super::handlers::ApiError;
use super::handlers::INVALID_TOKEN;
use crate::domain::identity::gate::GateOutcome;
use crate::domain::identity::models::CallerIdentity;
use crate::domain::identity::ports::CredentialStore;
use crate::inbound::http::router::AppState;

/// Middleware that runs the request gate and binds the caller identity.
///
/// Calls without a bearer token pass through anonymously; handlers that need
/// an identity reject them through the [`CallerIdentity`] extractor.
pub async fn authenticate<S: CredentialStore>(
    State(state): State<AppState<S>>,
    mut req: Request,
    next: Next,
) -> Response {
    let authorization = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    // The request body is not `Sync`: no borrow of `req` across the await.
    match state.gate.intercept(authorization.as_deref()).await {
        GateOutcome::Anonymous => next.run(req).await,
        GateOutcome::Authenticated(caller) => {
            req.extensions_mut().insert(caller);
            next.run(req).await
        }
        GateOutcome::Rejected(reason) => {
            tracing::warn!(reason = %reason, "Bearer token rejected");
            ApiError::Unauthorized(INVALID_TOKEN.to_string()).into_response()
        }
    }
}

#[async_trait]
impl<St> FromRequestParts<St> for CallerIdentity
where
    St: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
    }
}
