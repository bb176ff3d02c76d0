use sqlx::{Sqlite, SqliteConnection, SqlitePool};

use crate::{
    data_formats::{CommentRequest, QueryWindow},
    errors::RequestError,
    models::{ArticleWithAuthor, Comment},
};

use super::{get_article_with_author, get_articles_by_ids, get_comment_by_id, COMMENT_QUERY};

const COMMENT_NOT_FOUND: RequestError = RequestError::NotFound("Comment not found");
const ARTICLE_NOT_FOUND: RequestError = RequestError::NotFound("Article not found");

async fn comment_with_article(
    conn: &mut SqliteConnection,
    comment_id: i64,
) -> Result<(Comment, ArticleWithAuthor), RequestError> {
    let comment = match get_comment_by_id(conn, comment_id).await? {
        Some(comment) => comment,
        None => return Err(COMMENT_NOT_FOUND),
    };
    let article = match get_article_with_author(conn, comment.article_id).await? {
        Some(article) => article,
        None => return Err(ARTICLE_NOT_FOUND),
    };
    Ok((comment, article))
}

/// Any live user may comment on any live article.
pub async fn add_comment_to_article_in_db(
    pool: &SqlitePool,
    user_id: i64,
    article_id: i64,
    CommentRequest { content }: CommentRequest,
) -> Result<(Comment, ArticleWithAuthor), RequestError> {
    let mut tx = pool.begin().await?;

    let created = sqlx::query_as::<Sqlite, (i64,)>(
        r#"
        INSERT INTO comments (content, user_id, article_id)
        SELECT ?, users.id, articles.id
        FROM   articles, users
        WHERE  articles.id = ? AND articles.deleted_at IS NULL
               AND users.id = ? AND users.deleted_at IS NULL
        RETURNING id
        "#,
    )
    .bind(content)
    .bind(article_id)
    .bind(user_id)
    .fetch_optional(&mut tx)
    .await?;

    let (comment_id,) = match created {
        Some(row) => row,
        None => return Err(ARTICLE_NOT_FOUND),
    };

    let result = comment_with_article(&mut tx, comment_id).await?;
    tx.commit().await?;
    Ok(result)
}

pub async fn update_comment_in_db(
    pool: &SqlitePool,
    user_id: i64,
    comment_id: i64,
    CommentRequest { content }: CommentRequest,
) -> Result<(Comment, ArticleWithAuthor), RequestError> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE comments
        SET    content = ?, updated_at = CURRENT_TIMESTAMP
        WHERE  id = ? AND user_id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(content)
    .bind(comment_id)
    .bind(user_id)
    .execute(&mut tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(COMMENT_NOT_FOUND);
    }

    let result = comment_with_article(&mut tx, comment_id).await?;
    tx.commit().await?;
    Ok(result)
}

pub async fn delete_comment_in_db(
    pool: &SqlitePool,
    user_id: i64,
    comment_id: i64,
) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        r#"
        UPDATE comments SET deleted_at = CURRENT_TIMESTAMP
        WHERE  id = ? AND user_id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(comment_id)
    .bind(user_id)
    .execute(&mut tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(COMMENT_NOT_FOUND);
    }
    tx.commit().await?;
    Ok(())
}

pub async fn get_comments_for_article_in_db(
    pool: &SqlitePool,
    article_id: i64,
    QueryWindow { limit, offset }: QueryWindow,
) -> Result<(ArticleWithAuthor, Vec<Comment>), RequestError> {
    let mut tx = pool.begin().await?;
    let article = match get_article_with_author(&mut tx, article_id).await? {
        Some(article) => article,
        None => return Err(ARTICLE_NOT_FOUND),
    };
    let query = format!(
        "{COMMENT_QUERY} AND comments.article_id = ? ORDER BY comments.id LIMIT ? OFFSET ?"
    );
    let result = sqlx::query_as::<Sqlite, Comment>(&query)
        .bind(article.id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut tx)
        .await?;
    tx.commit().await?;
    Ok((article, result))
}

/// The caller's comments on articles that are still live.
pub async fn get_comments_by_user_in_db(
    pool: &SqlitePool,
    user_id: i64,
    QueryWindow { limit, offset }: QueryWindow,
) -> Result<Vec<(Comment, ArticleWithAuthor)>, RequestError> {
    let mut tx = pool.begin().await?;
    let query = format!(
        r#"{COMMENT_QUERY}
                   AND comments.user_id = ?
                   AND comments.article_id IN (SELECT id FROM articles WHERE deleted_at IS NULL)
            ORDER BY comments.id LIMIT ? OFFSET ?"#
    );
    let comments = sqlx::query_as::<Sqlite, Comment>(&query)
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut tx)
        .await?;

    let article_ids: Vec<i64> = comments.iter().map(|comment| comment.article_id).collect();
    let articles = get_articles_by_ids(&mut tx, &article_ids).await?;
    tx.commit().await?;

    let result = comments
        .into_iter()
        .filter_map(|comment| {
            let article = articles.get(&comment.article_id)?.clone();
            Some((comment, article))
        })
        .collect();
    Ok(result)
}
