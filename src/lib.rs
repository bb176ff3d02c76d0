mod authentication;
pub mod config;
mod data_formats;
mod db_helpers;
mod errors;
mod handlers;
mod models;

use std::{str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
pub use anyhow::Result;
pub use authentication::{AuthUser, TokenError, TokenService};
use axum::http::StatusCode;
use axum::{routing::*, Extension, Json, Router};
pub use config::Config;
pub use data_formats::*;
pub use errors::{RequestError, RequestErrorJson};
use handlers::*;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub type JsonResponse<T> = (StatusCode, Json<T>);

pub async fn run_app(config: Config) -> Result<()> {
    let pool = init_db(&config.database_url).await?;
    let tokens = Arc::new(TokenService::new(&config.jwt_secret));
    let app = make_router(pool.clone(), tokens);

    tracing::info!(address = %config.bind_address, "server started");
    axum::Server::try_bind(&config.bind_address)
        .with_context(|| format!("Failed to bind {}", config.bind_address))?
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}

pub async fn init_db(db_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(db_url)
        .context("DATABASE_URL is not a valid sqlite url")?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));
    let pool = SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .context("Failed to open database")?;
    tracing::info!("running migrations");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("migrations completed");
    Ok(pool)
}

pub fn make_router(pool: SqlitePool, tokens: Arc<TokenService>) -> Router {
    let api = Router::new()
        .route("/users", get(get_current_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/article", post(create_article).get(list_articles))
        .route(
            "/article/:id",
            get(get_article).put(update_article).delete(delete_article),
        )
        .route("/article/:id/comments", get(list_article_comments))
        .route("/likes", post(create_like).get(list_likes))
        .route("/like/:id", get(get_like).delete(delete_like))
        .route("/comments", get(list_my_comments))
        .route(
            "/comments/:id",
            post(create_comment)
                .put(update_comment)
                .delete(delete_comment),
        );

    Router::new()
        .route("/check_health", get(alive))
        .route("/login", post(login_user))
        .route("/users", post(register_users))
        .route("/search", get(search_articles))
        .nest("/api", api)
        .fallback(not_found)
        .layer(Extension(Arc::new(pool)))
        .layer(Extension(tokens))
        .layer(TraceLayer::new_for_http())
}
