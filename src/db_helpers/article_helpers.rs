use sqlx::{Sqlite, SqlitePool};

use crate::data_formats::{ArticleRequest, QueryWindow};
use crate::errors::RequestError;
use crate::models::{ArticleWithAuthor, Comment};

use super::{get_article_with_author, ARTICLE_QUERY, COMMENT_QUERY};

const ARTICLE_NOT_FOUND: RequestError = RequestError::NotFound("Article not found");

/// Escapes LIKE wildcards so the query matches as a literal substring.
/// Folding is ASCII-only to agree with SQLite's `LOWER()`.
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.to_ascii_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

pub async fn create_article_in_db(
    pool: &SqlitePool,
    author_id: i64,
    ArticleRequest { title, content }: ArticleRequest,
) -> Result<ArticleWithAuthor, RequestError> {
    let mut tx = pool.begin().await?;

    let created = sqlx::query_as::<Sqlite, (i64,)>(
        r#"
        INSERT INTO articles (title, content, author_id)
        SELECT ?, ?, users.id
        FROM   users
        WHERE  users.id = ? AND users.deleted_at IS NULL
        RETURNING id
        "#,
    )
    .bind(title)
    .bind(content)
    .bind(author_id)
    .fetch_optional(&mut tx)
    .await?;

    let (article_id,) = match created {
        Some(row) => row,
        None => return Err(RequestError::NotFound("User not found")),
    };

    let result = match get_article_with_author(&mut tx, article_id).await? {
        Some(article) => article,
        None => return Err(ARTICLE_NOT_FOUND),
    };
    tx.commit().await?;
    Ok(result)
}

/// Returns the caller's own article with its comments.
pub async fn get_article_in_db(
    pool: &SqlitePool,
    author_id: i64,
    article_id: i64,
) -> Result<(ArticleWithAuthor, Vec<Comment>), RequestError> {
    let mut tx = pool.begin().await?;

    let query = format!("{ARTICLE_QUERY} AND articles.id = ? AND articles.author_id = ?");
    let article = sqlx::query_as::<Sqlite, ArticleWithAuthor>(&query)
        .bind(article_id)
        .bind(author_id)
        .fetch_optional(&mut tx)
        .await?;
    let article = match article {
        Some(article) => article,
        None => return Err(ARTICLE_NOT_FOUND),
    };

    let query = format!("{COMMENT_QUERY} AND comments.article_id = ? ORDER BY comments.id");
    let comments = sqlx::query_as::<Sqlite, Comment>(&query)
        .bind(article.id)
        .fetch_all(&mut tx)
        .await?;

    tx.commit().await?;
    Ok((article, comments))
}

pub async fn list_articles_in_db(
    pool: &SqlitePool,
    author_id: i64,
    QueryWindow { limit, offset }: QueryWindow,
) -> Result<Vec<ArticleWithAuthor>, RequestError> {
    let mut tx = pool.begin().await?;
    let query =
        format!("{ARTICLE_QUERY} AND articles.author_id = ? ORDER BY articles.id LIMIT ? OFFSET ?");
    let result = sqlx::query_as::<Sqlite, ArticleWithAuthor>(&query)
        .bind(author_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(result)
}

/// Case-insensitive title search across every user's live articles.
pub async fn search_articles_in_db(
    pool: &SqlitePool,
    search: &str,
    QueryWindow { limit, offset }: QueryWindow,
) -> Result<Vec<ArticleWithAuthor>, RequestError> {
    if search.is_empty() {
        return Err(RequestError::InvalidArgument(
            "Query parameter 'q' is required".to_string(),
        ));
    }
    let mut tx = pool.begin().await?;
    let query = format!(
        r#"{ARTICLE_QUERY} AND LOWER(articles.title) LIKE ? ESCAPE '\' ORDER BY articles.id LIMIT ? OFFSET ?"#
    );
    let result = sqlx::query_as::<Sqlite, ArticleWithAuthor>(&query)
        .bind(like_pattern(search))
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(result)
}

/// Replaces title and content; the author never changes.
pub async fn update_article_in_db(
    pool: &SqlitePool,
    author_id: i64,
    article_id: i64,
    ArticleRequest { title, content }: ArticleRequest,
) -> Result<ArticleWithAuthor, RequestError> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE articles
        SET    title = ?, content = ?, updated_at = CURRENT_TIMESTAMP
        WHERE  id = ? AND author_id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(title)
    .bind(content)
    .bind(article_id)
    .bind(author_id)
    .execute(&mut tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ARTICLE_NOT_FOUND);
    }

    let result = match get_article_with_author(&mut tx, article_id).await? {
        Some(article) => article,
        None => return Err(ARTICLE_NOT_FOUND),
    };
    tx.commit().await?;
    Ok(result)
}

pub async fn delete_article_in_db(
    pool: &SqlitePool,
    author_id: i64,
    article_id: i64,
) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE articles SET deleted_at = CURRENT_TIMESTAMP
        WHERE  id = ? AND author_id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(article_id)
    .bind(author_id)
    .execute(&mut tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ARTICLE_NOT_FOUND);
    }

    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn search_pattern_is_a_lowercase_substring() {
        assert_eq!(like_pattern("Rust"), "%rust%");
    }

    #[test]
    fn search_pattern_leaves_non_ascii_case_alone() {
        assert_eq!(like_pattern("ÉCOLE"), "%École%");
        assert_eq!(like_pattern("Straße"), "%straße%");
    }

    #[test]
    fn search_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("100%_done"), "%100\\%\\_done%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
