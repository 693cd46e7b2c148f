use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::authenticate::authenticate;
use super::handlers::me::me;
use super::handlers::register::register;
use super::middleware::authenticate as auth_middleware;
use crate::domain::identity::gate::RequestGate;
use crate::domain::identity::ports::CredentialStore;
use crate::domain::identity::service::IdentityService;

pub struct AppState<S>
where
    S: CredentialStore,
{
    pub auth_service: Arc<IdentityService<S>>,
    pub gate: Arc<RequestGate<S>>,
}

impl<S> AppState<S>
where
    S: CredentialStore,
{
    /// Wire the orchestrator and the request gate over one shared store.
    pub fn new(store: Arc<S>, authenticator: Arc<Authenticator>, store_timeout: Duration) -> Self {
        Self {
            auth_service: Arc::new(IdentityService::new(
                Arc::clone(&store),
                Arc::clone(&authenticator),
                store_timeout,
            )),
            gate: Arc::new(RequestGate::new(store, authenticator, store_timeout)),
        }
    }
}

// Manual impl: a derive would require `S: Clone`.
impl<S> Clone for AppState<S>
where
    S: CredentialStore,
{
    fn clone(&self) -> Self {
        Self {
            auth_service: Arc::clone(&self.auth_service),
            gate: Arc::clone(&self.gate),
        }
    }
}

pub fn create_router<S>(
    store: Arc<S>,
    authenticator: Arc<Authenticator>,
    store_timeout: Duration,
) -> Router
where
    S: CredentialStore,
{
    let state = AppState::new(store, authenticator, store_timeout);

    let public_routes = Router::new()
        .route("/api/v1/auth/register", post(register::<S>))
        .route("/api/v1/auth/authenticate", post(authenticate::<S>));

    let protected_routes = Router::new()
        .route("/api/v1/me", get(me))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::<S>,
        ));

    // Headers are left out of the span: they carry bearer tokens.
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis() as u64,
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
