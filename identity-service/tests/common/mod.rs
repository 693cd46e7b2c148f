use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use auth::PasswordHasher;
use auth::TokenCodec;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::repositories::InMemoryCredentialStore;
use serde_json::json;

pub const TEST_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub store: Arc<InMemoryCredentialStore>,
    pub api_client: reqwest::Client,
    pub token_codec: TokenCodec,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let store = Arc::new(InMemoryCredentialStore::new());

        // Cheap Argon2 parameters keep the suite fast
        let authenticator = Arc::new(
            Authenticator::new(
                PasswordHasher::with_params(64, 1, 1).expect("Invalid hasher params"),
                TokenCodec::new(TEST_SECRET).expect("Invalid signing secret"),
                Some(chrono::Duration::hours(24)),
            )
            .expect("Failed to build authenticator"),
        );

        let router = create_router(Arc::clone(&store), authenticator, Duration::from_secs(5));

        tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("Server failed to start");
        });

        Self {
            address,
            store,
            api_client: reqwest::Client::new(),
            token_codec: TokenCodec::new(TEST_SECRET).expect("Invalid signing secret"),
        }
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(&format!("{}{}", self.address, path))
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(&format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .get(&format!("{}{}", self.address, path))
            .bearer_auth(token)
    }

    /// Register a user and return the response
    pub async fn register(&self, username: &str, password: &str) -> reqwest::Response {
        self.post("/api/v1/auth/register")
            .json(&json!({
                "firstName": "Ann",
                "lastName": "Lee",
                "username": username,
                "password": password
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Log in and return the response
    pub async fn authenticate(&self, username: &str, password: &str) -> reqwest::Response {
        self.post("/api/v1/auth/authenticate")
            .json(&json!({
                "username": username,
                "password": password
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Extract the token from a successful register/authenticate response
    pub async fn token_from(response: reqwest::Response) -> String {
        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        body["data"]["token"]
            .as_str()
            .expect("Response has no token")
            .to_string()
    }
}
