use chrono::NaiveDateTime;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: NaiveDateTime,
}

/// An article joined with its author and its live like count.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArticleWithAuthor {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub created_at: NaiveDateTime,
    pub author_first_name: String,
    pub author_last_name: String,
    pub author_username: String,
    pub author_email: String,
    pub likes_count: i64,
}

/// A comment joined with the user who wrote it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub user_id: i64,
    pub article_id: i64,
    pub created_at: NaiveDateTime,
    pub user_first_name: String,
    pub user_last_name: String,
    pub user_username: String,
    pub user_email: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Like {
    pub id: i64,
    pub user_id: i64,
    pub article_id: i64,
    pub created_at: NaiveDateTime,
}
