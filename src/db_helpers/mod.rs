use std::collections::HashMap;

use sqlx::{Sqlite, SqliteConnection};

use crate::{
    errors::RequestError,
    models::{ArticleWithAuthor, Comment, User},
};

mod article_helpers;
mod comment_helpers;
mod like_helpers;
mod user_helpers;

pub use article_helpers::*;
pub use comment_helpers::*;
pub use like_helpers::*;
pub use user_helpers::*;

const USER_QUERY: &str = r#"
            SELECT id, first_name, last_name, username, email, password, created_at
            FROM   users
            WHERE  deleted_at IS NULL
"#;

const ARTICLE_QUERY: &str = r#"
            SELECT articles.id         AS "id",
                   articles.title      AS "title",
                   articles.content    AS "content",
                   articles.author_id  AS "author_id",
                   articles.created_at AS "created_at",
                   users.first_name    AS "author_first_name",
                   users.last_name     AS "author_last_name",
                   users.username      AS "author_username",
                   users.email         AS "author_email",
                   (SELECT Count(*)
                    FROM   likes
                    WHERE  likes.article_id = articles.id
                           AND likes.deleted_at IS NULL) AS "likes_count"
            FROM   articles
                   JOIN users
                     ON users.id = articles.author_id
            WHERE  articles.deleted_at IS NULL
"#;

const COMMENT_QUERY: &str = r#"
            SELECT comments.id         AS "id",
                   comments.content    AS "content",
                   comments.user_id    AS "user_id",
                   comments.article_id AS "article_id",
                   comments.created_at AS "created_at",
                   users.first_name    AS "user_first_name",
                   users.last_name     AS "user_last_name",
                   users.username      AS "user_username",
                   users.email         AS "user_email"
            FROM   comments
                   JOIN users
                     ON users.id = comments.user_id
            WHERE  comments.deleted_at IS NULL
"#;

// ----------------- Helper Functions -----------------

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

pub async fn get_user_by_id(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<User>, RequestError> {
    let query = format!("{USER_QUERY} AND id = ?");
    let result = sqlx::query_as::<Sqlite, User>(&query)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(result)
}

pub async fn get_user_by_email(
    conn: &mut SqliteConnection,
    email: &str,
) -> Result<Option<User>, RequestError> {
    let query = format!("{USER_QUERY} AND email = ?");
    let result = sqlx::query_as::<Sqlite, User>(&query)
        .bind(email)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(result)
}

async fn get_article_with_author(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<ArticleWithAuthor>, RequestError> {
    let query = format!("{ARTICLE_QUERY} AND articles.id = ?");
    let result = sqlx::query_as::<Sqlite, ArticleWithAuthor>(&query)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(result)
}

/// Live articles keyed by id; ids of deleted articles are absent from the map.
async fn get_articles_by_ids(
    conn: &mut SqliteConnection,
    ids: &[i64],
) -> Result<HashMap<i64, ArticleWithAuthor>, RequestError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let query = format!(
        "{ARTICLE_QUERY} AND articles.id IN ({})",
        placeholders(ids.len())
    );
    let mut query = sqlx::query_as::<Sqlite, ArticleWithAuthor>(&query);
    for id in ids {
        query = query.bind(*id);
    }
    let result = query
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(|article| (article.id, article))
        .collect();
    Ok(result)
}

async fn get_comment_by_id(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<Comment>, RequestError> {
    let query = format!("{COMMENT_QUERY} AND comments.id = ?");
    let result = sqlx::query_as::<Sqlite, Comment>(&query)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(result)
}
