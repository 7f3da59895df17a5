#![allow(dead_code)]

use std::sync::Arc;

use account_service::account::ports::AuthServicePort;
use account_service::account::service::AuthService;
use account_service::inbound::http::router::create_router;
use account_service::repositories::InMemoryAccountRepository;
use auth::Authenticator;
use auth::TokenLifetimes;

pub const ACCESS_SECRET: &[u8] = b"test-access-secret-key-at-least-32-bytes";
pub const REFRESH_SECRET: &[u8] = b"test-refresh-secret-key-at-least-32-bytes";

pub fn authenticator() -> Arc<Authenticator> {
    Arc::new(Authenticator::new(
        ACCESS_SECRET,
        REFRESH_SECRET,
        TokenLifetimes::default(),
    ))
}

/// Engine wired to an in-memory store, with handles on both for assertions
pub struct TestEngine {
    pub service: AuthService<InMemoryAccountRepository>,
    pub repository: Arc<InMemoryAccountRepository>,
    pub authenticator: Arc<Authenticator>,
}

impl TestEngine {
    pub fn new() -> Self {
        let repository = Arc::new(InMemoryAccountRepository::new());
        let authenticator = authenticator();
        let service = AuthService::new(Arc::clone(&repository), Arc::clone(&authenticator));

        Self {
            service,
            repository,
            authenticator,
        }
    }
}

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub repository: Arc<InMemoryAccountRepository>,
    pub authenticator: Arc<Authenticator>,
    pub api_client: reqwest::Client,
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

        let repository = Arc::new(InMemoryAccountRepository::new());
        let authenticator = authenticator();
        let auth_service: Arc<dyn AuthServicePort> = Arc::new(AuthService::new(
            Arc::clone(&repository),
            Arc::clone(&authenticator),
        ));

        let router = create_router(auth_service);

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            port,
            repository,
            authenticator,
            api_client: reqwest::Client::builder()
                .build()
                .expect("Failed to create reqwest client"),
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(&format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(&format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Helper to make POST request with Bearer token
    pub fn post_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.post(path).bearer_auth(token)
    }

    /// Register an account and return the response body
    pub async fn register(&self, username: &str, password: &str) -> serde_json::Value {
        let response = self
            .post("/api/v1/register")
            .json(&serde_json::json!({
                "username": username,
                "password": password,
            }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), 201);
        response.json().await.expect("Failed to parse response")
    }
}
