#![allow(dead_code)]

use std::{net::TcpListener, path::PathBuf, sync::Arc};

use blog_api::{init_db, make_router, TokenService};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};

pub const TEST_SECRET: &str = "test-secret";

pub struct TestApp {
    pub base_url: String,
    pub client: Client,
    pub tokens: Arc<TokenService>,
    db_path: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut path = self.db_path.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Serves the real router on an ephemeral port backed by a fresh database file.
pub async fn spawn_app() -> TestApp {
    let db_path =
        std::env::temp_dir().join(format!("blog-api-test-{}.db", rand::random::<u64>()));
    let pool = init_db(&format!("sqlite://{}", db_path.display()))
        .await
        .expect("failed to initialise test database");
    let tokens = Arc::new(TokenService::new(TEST_SECRET));
    let app = make_router(pool, tokens.clone());

    let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind test listener");
    let address = listener.local_addr().expect("listener has no address");
    tokio::spawn(async move {
        axum::Server::from_tcp(listener)
            .expect("failed to adopt listener")
            .serve(app.into_make_service())
            .await
            .expect("test server failed");
    });

    TestApp {
        base_url: format!("http://{}", address),
        client: Client::new(),
        tokens,
        db_path,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.client.put(self.url(path))
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.client.delete(self.url(path))
    }

    /// Creates an account `<name>` with email `<name>@x.com` and password `p`.
    pub async fn signup(&self, name: &str) -> Value {
        let response = self
            .post("/users")
            .json(&json!({
                "first_name": name.to_uppercase(),
                "last_name": "Tester",
                "username": name,
                "email": format!("{name}@x.com"),
                "password": "p",
            }))
            .send()
            .await
            .expect("signup request failed");
        assert_eq!(response.status(), StatusCode::CREATED);
        response.json().await.expect("signup body is not json")
    }

    pub async fn login(&self, name: &str) -> String {
        let response = self
            .post("/login")
            .json(&json!({ "email": format!("{name}@x.com"), "password": "p" }))
            .send()
            .await
            .expect("login request failed");
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.expect("login body is not json");
        body["token"]
            .as_str()
            .expect("login response carries a token")
            .to_string()
    }

    /// Signs up and logs in, returning the raw token.
    pub async fn user(&self, name: &str) -> String {
        self.signup(name).await;
        self.login(name).await
    }

    pub async fn create_article(&self, token: &str, title: &str, content: &str) -> Value {
        let response = self
            .post("/api/article")
            .header("Authorization", token)
            .json(&json!({ "title": title, "content": content }))
            .send()
            .await
            .expect("create article request failed");
        assert_eq!(response.status(), StatusCode::CREATED);
        response.json().await.expect("article body is not json")
    }
}

pub async fn error_of(response: Response) -> String {
    let body: Value = response.json().await.expect("error body is not json");
    body["error"]
        .as_str()
        .expect("error body carries an error field")
        .to_string()
}
