//! Common test utilities for E2E tests

use rustsocial::{AppState, config};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

/// A registered user with a live token
pub struct TestUser {
    pub id: String,
    pub username: String,
    pub token: String,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        // Create test configuration
        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                domain: "test.example.com".to_string(),
                protocol: "https".to_string(),
            },
            database: config::DatabaseConfig {
                path: db_path.clone(),
                max_connections: 5,
            },
            pagination: config::PaginationConfig::default(),
            auth: config::AuthConfig {
                min_password_length: 8,
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        rustsocial::metrics::init_metrics();

        // Initialize app state
        let state = AppState::new(config).await.unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = rustsocial::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Register a user through the API and return its JSON
    pub async fn register(&self, username: &str, password: &str) -> Value {
        let response = self
            .client
            .post(self.url("/api/accounts/register"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201, "register {username}");
        response.json().await.unwrap()
    }

    /// Log in and return the token
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .client
            .post(self.url("/api/accounts/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201, "login {username}");
        let body: Value = response.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    /// Register and log in
    pub async fn create_user(&self, username: &str) -> TestUser {
        let user = self.register(username, "password123").await;
        let token = self.login(username, "password123").await;

        TestUser {
            id: user["id"].as_str().unwrap().to_string(),
            username: username.to_string(),
            token,
        }
    }

    /// Create a post as `user` and return its JSON
    pub async fn create_post(&self, user: &TestUser, title: &str, content: &str) -> Value {
        let response = self
            .client
            .post(self.url("/api/posts"))
            .bearer_auth(&user.token)
            .json(&json!({ "title": title, "content": content }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201, "create post {title}");
        response.json().await.unwrap()
    }

    /// Follow `target` as `user`
    pub async fn follow(&self, user: &TestUser, target: &TestUser) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/api/accounts/users/{}/follow", target.id)))
            .bearer_auth(&user.token)
            .send()
            .await
            .unwrap()
    }
}
