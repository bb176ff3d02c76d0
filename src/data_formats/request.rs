use serde::{Deserialize, Serialize};

use crate::errors::RequestError;

fn require(field: &'static str, value: &str) -> Result<(), RequestError> {
    if value.trim().is_empty() {
        return Err(RequestError::InvalidArgument(format!("{field} is required")));
    }
    Ok(())
}

// ----------------- User Request -----------------
#[derive(Deserialize, Serialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct NewUser {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), RequestError> {
        require("username", &self.username)?;
        require("email", &self.email)?;
        require("password", &self.password)
    }
}

/// Signup body: either a single account or a batch of accounts.
#[derive(Deserialize, Serialize, Debug)]
#[serde(untagged)]
pub enum CreateUsersRequest {
    Many(Vec<NewUser>),
    One(NewUser),
}

#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default)]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        if let Some(username) = &self.username {
            require("username", username)?;
        }
        if let Some(email) = &self.email {
            require("email", email)?;
        }
        if let Some(password) = &self.password {
            require("password", password)?;
        }
        Ok(())
    }
}

// ----------------- Article Request -----------------
#[derive(Deserialize, Serialize, Debug)]
pub struct ArticleRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl ArticleRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        require("title", &self.title)?;
        require("content", &self.content)
    }
}

// ----------------- Comment Request -----------------
#[derive(Deserialize, Serialize, Debug)]
pub struct CommentRequest {
    #[serde(default)]
    pub content: String,
}

impl CommentRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        require("content", &self.content)
    }
}

// ----------------- Like Request -----------------
#[derive(Deserialize, Serialize, Debug)]
pub struct LikeRequest {
    pub article_id: i64,
}
