use axum::http::StatusCode;
use serde::Serialize;

use super::ApiSuccess;
use crate::domain::identity::models::Authority;
use crate::domain::identity::models::CallerIdentity;

/// Return the identity the request gate bound to this call.
pub async fn me(caller: CallerIdentity) -> ApiSuccess<CallerResponseData> {
    ApiSuccess::new(StatusCode::OK, (&caller).into())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallerResponseData {
    pub username: String,
    pub authorities: Vec<Authority>,
}

impl From<&CallerIdentity> for CallerResponseData {
    fn from(caller: &CallerIdentity) -> Self {
        Self {
            username: caller.username.as_str().to_string(),
            authorities: caller.authorities.clone(),
        }
    }
}
