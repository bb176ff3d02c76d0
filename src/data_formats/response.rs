use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::{ArticleWithAuthor, Comment, Like, User};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

fn format_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Public profile of a user. Never carries the password hash.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct UserResponse {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Signup responses mirror the shape of the request body.
#[derive(Deserialize, Serialize, Debug)]
#[serde(untagged)]
pub enum CreatedUsersResponse {
    Many(Vec<UserResponse>),
    One(UserResponse),
}

#[derive(Deserialize, Serialize, Debug)]
pub struct ArticleResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author: UserResponse,
    pub publication_date: String,
    pub likes: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<ArticleCommentResponse>,
}

/// A comment as embedded inside its article.
#[derive(Deserialize, Serialize, Debug)]
pub struct ArticleCommentResponse {
    pub id: i64,
    pub content: String,
    pub user: UserResponse,
    pub commented_at: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct CommentResponse {
    pub id: i64,
    pub content: String,
    pub user: UserResponse,
    pub article: ArticleResponse,
    pub commented_at: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct LikeResponse {
    pub id: i64,
    pub user: UserResponse,
    pub article: ArticleResponse,
    pub liked_at: String,
}

impl UserResponse {
    pub fn new(
        User {
            id,
            first_name,
            last_name,
            username,
            email,
            ..
        }: User,
    ) -> Self {
        UserResponse {
            id,
            first_name,
            last_name,
            username,
            email,
        }
    }

    fn comment_author(comment: &Comment) -> Self {
        UserResponse {
            id: comment.user_id,
            first_name: comment.user_first_name.clone(),
            last_name: comment.user_last_name.clone(),
            username: comment.user_username.clone(),
            email: comment.user_email.clone(),
        }
    }
}

impl ArticleResponse {
    pub fn new(
        ArticleWithAuthor {
            id,
            title,
            content,
            author_id,
            created_at,
            author_first_name,
            author_last_name,
            author_username,
            author_email,
            likes_count,
            ..
        }: ArticleWithAuthor,
    ) -> Self {
        ArticleResponse {
            id,
            title,
            content,
            author: UserResponse {
                id: author_id,
                first_name: author_first_name,
                last_name: author_last_name,
                username: author_username,
                email: author_email,
            },
            publication_date: format_timestamp(created_at),
            likes: likes_count,
            comments: Vec::new(),
        }
    }

    pub fn with_comments(mut self, comments: Vec<Comment>) -> Self {
        self.comments = comments
            .into_iter()
            .map(ArticleCommentResponse::new)
            .collect();
        self
    }
}

impl ArticleCommentResponse {
    pub fn new(comment: Comment) -> Self {
        ArticleCommentResponse {
            user: UserResponse::comment_author(&comment),
            id: comment.id,
            content: comment.content,
            commented_at: format_timestamp(comment.created_at),
        }
    }
}

impl CommentResponse {
    pub fn new(comment: Comment, article: ArticleWithAuthor) -> Self {
        CommentResponse {
            user: UserResponse::comment_author(&comment),
            id: comment.id,
            content: comment.content,
            article: ArticleResponse::new(article),
            commented_at: format_timestamp(comment.created_at),
        }
    }
}

impl LikeResponse {
    pub fn new(
        Like { id, created_at, .. }: Like,
        user: UserResponse,
        article: ArticleWithAuthor,
    ) -> Self {
        LikeResponse {
            id,
            user,
            article: ArticleResponse::new(article),
            liked_at: format_timestamp(created_at),
        }
    }
}
