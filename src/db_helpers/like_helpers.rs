use sqlx::{Sqlite, SqlitePool};

use crate::{
    data_formats::QueryWindow,
    errors::RequestError,
    models::{ArticleWithAuthor, Like, User},
};

use super::{get_article_with_author, get_articles_by_ids, get_user_by_id};

const LIKE_NOT_FOUND: RequestError = RequestError::NotFound("Like not found");
const ARTICLE_NOT_FOUND: RequestError = RequestError::NotFound("Article not found");

/// Records a like; a second live like for the same pair is rejected by the
/// partial unique index and surfaces as `Conflict("AlreadyLiked")`.
pub async fn like_article_in_db(
    pool: &SqlitePool,
    user_id: i64,
    article_id: i64,
) -> Result<(Like, User, ArticleWithAuthor), RequestError> {
    let mut tx = pool.begin().await?;

    let like = sqlx::query_as::<Sqlite, Like>(
        r#"
        INSERT INTO likes (user_id, article_id)
        SELECT users.id, articles.id
        FROM   articles, users
        WHERE  articles.id = ? AND articles.deleted_at IS NULL
               AND users.id = ? AND users.deleted_at IS NULL
        RETURNING id, user_id, article_id, created_at
        "#,
    )
    .bind(article_id)
    .bind(user_id)
    .fetch_optional(&mut tx)
    .await
    .map_err(|e| RequestError::from(e).conflict_as("AlreadyLiked"))?;

    let like = match like {
        Some(like) => like,
        None => return Err(ARTICLE_NOT_FOUND),
    };
    let user = match get_user_by_id(&mut tx, user_id).await? {
        Some(user) => user,
        None => return Err(RequestError::NotFound("User not found")),
    };
    let article = match get_article_with_author(&mut tx, article_id).await? {
        Some(article) => article,
        None => return Err(ARTICLE_NOT_FOUND),
    };
    tx.commit().await?;
    Ok((like, user, article))
}

pub async fn unlike_article_in_db(
    pool: &SqlitePool,
    user_id: i64,
    article_id: i64,
) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        r#"
        UPDATE likes SET deleted_at = CURRENT_TIMESTAMP
        WHERE  user_id = ? AND article_id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(user_id)
    .bind(article_id)
    .execute(&mut tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(LIKE_NOT_FOUND);
    }
    tx.commit().await?;
    Ok(())
}

/// The caller's live like on one article.
pub async fn get_like_in_db(
    pool: &SqlitePool,
    user_id: i64,
    article_id: i64,
) -> Result<(Like, User, ArticleWithAuthor), RequestError> {
    let mut tx = pool.begin().await?;
    let like = sqlx::query_as::<Sqlite, Like>(
        r#"
        SELECT id, user_id, article_id, created_at
        FROM   likes
        WHERE  user_id = ? AND article_id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(user_id)
    .bind(article_id)
    .fetch_optional(&mut tx)
    .await?;

    let like = match like {
        Some(like) => like,
        None => return Err(LIKE_NOT_FOUND),
    };
    let user = match get_user_by_id(&mut tx, user_id).await? {
        Some(user) => user,
        None => return Err(RequestError::NotFound("User not found")),
    };
    let article = match get_article_with_author(&mut tx, like.article_id).await? {
        Some(article) => article,
        None => return Err(LIKE_NOT_FOUND),
    };
    tx.commit().await?;
    Ok((like, user, article))
}

/// The caller's likes on articles that are still live, oldest first.
pub async fn list_likes_in_db(
    pool: &SqlitePool,
    user_id: i64,
    QueryWindow { limit, offset }: QueryWindow,
) -> Result<(User, Vec<(Like, ArticleWithAuthor)>), RequestError> {
    let mut tx = pool.begin().await?;
    let user = match get_user_by_id(&mut tx, user_id).await? {
        Some(user) => user,
        None => return Err(RequestError::NotFound("User not found")),
    };

    let likes = sqlx::query_as::<Sqlite, Like>(
        r#"
        SELECT likes.id         AS "id",
               likes.user_id    AS "user_id",
               likes.article_id AS "article_id",
               likes.created_at AS "created_at"
        FROM   likes
               JOIN articles
                 ON articles.id = likes.article_id
        WHERE  likes.user_id = ?
               AND likes.deleted_at IS NULL
               AND articles.deleted_at IS NULL
        ORDER  BY likes.id
        LIMIT  ? OFFSET ?
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&mut tx)
    .await?;

    let article_ids: Vec<i64> = likes.iter().map(|like| like.article_id).collect();
    let articles = get_articles_by_ids(&mut tx, &article_ids).await?;
    tx.commit().await?;

    let result = likes
        .into_iter()
        .filter_map(|like| {
            let article = articles.get(&like.article_id)?.clone();
            Some((like, article))
        })
        .collect();
    Ok((user, result))
}
