use sqlx::{Sqlite, SqlitePool};

use crate::{
    authentication::hash_password_argon2,
    data_formats::{NewUser, UpdateUserRequest},
    errors::RequestError,
    models::User,
};

use super::get_user_by_id;

const USERNAME_OR_EMAIL_TAKEN: &str = "Username or email already taken";

/// Inserts every account in one transaction; passwords must already be hashed.
pub async fn insert_users_in_db(
    pool: &SqlitePool,
    users: Vec<NewUser>,
) -> Result<Vec<User>, RequestError> {
    let mut tx = pool.begin().await?;
    let mut created = Vec::with_capacity(users.len());
    for user in users {
        let result = sqlx::query_as::<Sqlite, User>(
            r#"
            INSERT INTO users (first_name, last_name, username, email, password)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, first_name, last_name, username, email, password, created_at
            "#,
        )
        .bind(user.first_name)
        .bind(user.last_name)
        .bind(user.username)
        .bind(user.email)
        .bind(user.password)
        .fetch_one(&mut tx)
        .await
        .map_err(|e| RequestError::from(e).conflict_as(USERNAME_OR_EMAIL_TAKEN))?;
        created.push(result);
    }
    tx.commit().await?;
    Ok(created)
}

pub async fn find_user_by_id_in_db(pool: &SqlitePool, id: i64) -> Result<User, RequestError> {
    let mut tx = pool.begin().await?;
    let result = get_user_by_id(&mut tx, id).await?;
    tx.commit().await?;
    result.ok_or(RequestError::NotFound("User not found"))
}

pub async fn find_user_by_email_in_db(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<User>, RequestError> {
    let mut tx = pool.begin().await?;
    let result = super::get_user_by_email(&mut tx, email).await?;
    tx.commit().await?;
    Ok(result)
}

/// Accounts only mutate themselves; any other target reads as missing.
pub async fn update_user_in_db(
    pool: &SqlitePool,
    caller_id: i64,
    target_id: i64,
    UpdateUserRequest {
        first_name,
        last_name,
        username,
        email,
        password,
    }: UpdateUserRequest,
) -> Result<User, RequestError> {
    if caller_id != target_id {
        return Err(RequestError::NotFound("User not found"));
    }
    let password = match password {
        Some(password) => Some(hash_password_argon2(password).await.map_err(|e| {
            tracing::error!(error = %e, "password hashing failed");
            RequestError::ServerError
        })?),
        None => None,
    };

    let mut tx = pool.begin().await?;
    let result = sqlx::query_as::<Sqlite, User>(
        r#"
        UPDATE users
        SET    first_name = COALESCE(?, first_name),
               last_name  = COALESCE(?, last_name),
               username   = COALESCE(?, username),
               email      = COALESCE(?, email),
               password   = COALESCE(?, password),
               updated_at = CURRENT_TIMESTAMP
        WHERE  id = ? AND deleted_at IS NULL
        RETURNING id, first_name, last_name, username, email, password, created_at
        "#,
    )
    .bind(first_name)
    .bind(last_name)
    .bind(username)
    .bind(email)
    .bind(password)
    .bind(target_id)
    .fetch_optional(&mut tx)
    .await
    .map_err(|e| RequestError::from(e).conflict_as(USERNAME_OR_EMAIL_TAKEN))?;

    let result = match result {
        Some(user) => user,
        None => return Err(RequestError::NotFound("User not found")),
    };
    tx.commit().await?;
    Ok(result)
}

pub async fn delete_user_in_db(
    pool: &SqlitePool,
    caller_id: i64,
    target_id: i64,
) -> Result<(), RequestError> {
    if caller_id != target_id {
        return Err(RequestError::NotFound("User not found"));
    }
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        r#"
        UPDATE users SET deleted_at = CURRENT_TIMESTAMP
        WHERE  id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(target_id)
    .execute(&mut tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound("User not found"));
    }
    tx.commit().await?;
    Ok(())
}
