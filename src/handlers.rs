use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query,
    },
    http::{StatusCode, Uri},
    Extension, Json,
};
use sqlx::SqlitePool;

use crate::{
    authentication::{hash_password_argon2, verify_password_argon2, AuthUser, TokenService},
    db_helpers::{
        add_comment_to_article_in_db, create_article_in_db, delete_article_in_db,
        delete_comment_in_db, delete_user_in_db, find_user_by_email_in_db, find_user_by_id_in_db,
        get_article_in_db, get_comments_by_user_in_db, get_comments_for_article_in_db,
        get_like_in_db, insert_users_in_db, like_article_in_db, list_articles_in_db,
        list_likes_in_db, search_articles_in_db, unlike_article_in_db, update_article_in_db,
        update_comment_in_db, update_user_in_db,
    },
    errors::{RequestError, RequestErrorJson},
    ArticleRequest, ArticleResponse, CommentRequest, CommentResponse, CreateUsersRequest,
    CreatedUsersResponse, JsonResponse, LikeRequest, LikeResponse, LoginRequest, LoginResponse,
    NewUser, QueryPairs, SearchParams, UpdateUserRequest, UserResponse, WindowParams,
};

type JsonResult<T> = Result<JsonResponse<T>, RequestError>;
type Pool = Extension<Arc<SqlitePool>>;
type JsonBody<T> = Result<Json<T>, JsonRejection>;
type QueryString = Result<Query<QueryPairs>, QueryRejection>;

fn parse_id(raw: &str) -> Result<i64, RequestError> {
    raw.parse()
        .map_err(|_| RequestError::InvalidArgument("Make sure id is an integer".to_string()))
}

async fn hash_user_password(mut user: NewUser) -> Result<NewUser, RequestError> {
    user.password = hash_password_argon2(user.password).await.map_err(|e| {
        tracing::error!(error = %e, "password hashing failed");
        RequestError::ServerError
    })?;
    Ok(user)
}

// ----------------- Helper Handlers -----------------
pub async fn alive() -> &'static str {
    "alive"
}

pub async fn not_found(uri: Uri) -> (StatusCode, Json<RequestErrorJson>) {
    (
        StatusCode::NOT_FOUND,
        Json(RequestErrorJson::with_details(
            "Not Found",
            &format!("URL {} provided was not found", uri),
        )),
    )
}

// ----------------- User Handlers -----------------
pub async fn login_user(
    Extension(pool): Pool,
    Extension(tokens): Extension<Arc<TokenService>>,
    payload: JsonBody<LoginRequest>,
) -> JsonResult<LoginResponse> {
    let Json(request) = payload?;
    let user = match find_user_by_email_in_db(&pool, &request.email).await? {
        Some(user) => user,
        None => return Err(RequestError::Unauthenticated("Invalid credentials")),
    };
    let is_password_correct = verify_password_argon2(request.password, user.password.clone())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "password verification failed");
            RequestError::ServerError
        })?;
    if !is_password_correct {
        return Err(RequestError::Unauthenticated("Invalid credentials"));
    }

    let token = tokens.issue(user.id, &user.email).map_err(|e| {
        tracing::error!(error = %e, "token signing failed");
        RequestError::ServerError
    })?;
    tracing::info!(user_id = user.id, "user logged in");
    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            token,
            user: UserResponse::new(user),
        }),
    ))
}

pub async fn register_users(
    Extension(pool): Pool,
    payload: JsonBody<CreateUsersRequest>,
) -> JsonResult<CreatedUsersResponse> {
    let Json(request) = payload.map_err(|e| RequestError::InvalidBody {
        message: "Invalid request format",
        details: format!(
            "Expected either a single user object or an array of users: {}",
            e.body_text()
        ),
    })?;

    let response = match request {
        CreateUsersRequest::One(user) => {
            user.validate()?;
            let user = hash_user_password(user).await?;
            let mut created = insert_users_in_db(&pool, vec![user]).await?;
            match created.pop() {
                Some(user) => CreatedUsersResponse::One(UserResponse::new(user)),
                None => return Err(RequestError::ServerError),
            }
        }
        CreateUsersRequest::Many(users) => {
            if users.is_empty() {
                return Err(RequestError::InvalidArgument(
                    "Empty list of users".to_string(),
                ));
            }
            for user in &users {
                user.validate()?;
            }
            let mut hashed = Vec::with_capacity(users.len());
            for user in users {
                hashed.push(hash_user_password(user).await?);
            }
            let created = insert_users_in_db(&pool, hashed).await?;
            CreatedUsersResponse::Many(created.into_iter().map(UserResponse::new).collect())
        }
    };
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn get_current_user(
    Extension(pool): Pool,
    AuthUser { id, .. }: AuthUser,
) -> JsonResult<UserResponse> {
    let user = find_user_by_id_in_db(&pool, id).await?;
    Ok((StatusCode::OK, Json(UserResponse::new(user))))
}

pub async fn get_user(
    Extension(pool): Pool,
    _: AuthUser,
    Path(id): Path<String>,
) -> JsonResult<UserResponse> {
    let user = find_user_by_id_in_db(&pool, parse_id(&id)?).await?;
    Ok((StatusCode::OK, Json(UserResponse::new(user))))
}

pub async fn update_user(
    Extension(pool): Pool,
    user: AuthUser,
    Path(id): Path<String>,
    payload: JsonBody<UpdateUserRequest>,
) -> JsonResult<UserResponse> {
    let id = parse_id(&id)?;
    let Json(request) = payload?;
    request.validate()?;
    let user = update_user_in_db(&pool, user.id, id, request).await?;
    Ok((StatusCode::OK, Json(UserResponse::new(user))))
}

pub async fn delete_user(
    Extension(pool): Pool,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, RequestError> {
    delete_user_in_db(&pool, user.id, parse_id(&id)?).await?;
    tracing::info!(user_id = user.id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
// ----------------- End User Handlers -----------------

// ----------------- Article Handlers -----------------
pub async fn create_article(
    Extension(pool): Pool,
    user: AuthUser,
    payload: JsonBody<ArticleRequest>,
) -> JsonResult<ArticleResponse> {
    let Json(request) = payload?;
    request.validate()?;
    let article = create_article_in_db(&pool, user.id, request).await?;
    Ok((StatusCode::CREATED, Json(ArticleResponse::new(article))))
}

pub async fn list_articles(
    Extension(pool): Pool,
    user: AuthUser,
    query: QueryString,
) -> JsonResult<Vec<ArticleResponse>> {
    let Query(pairs) = query?;
    let window = WindowParams::from_pairs(&pairs).window();
    let articles = list_articles_in_db(&pool, user.id, window).await?;
    let result = articles.into_iter().map(ArticleResponse::new).collect();
    Ok((StatusCode::OK, Json(result)))
}

pub async fn get_article(
    Extension(pool): Pool,
    user: AuthUser,
    Path(id): Path<String>,
) -> JsonResult<ArticleResponse> {
    let (article, comments) = get_article_in_db(&pool, user.id, parse_id(&id)?).await?;
    Ok((
        StatusCode::OK,
        Json(ArticleResponse::new(article).with_comments(comments)),
    ))
}

pub async fn update_article(
    Extension(pool): Pool,
    user: AuthUser,
    Path(id): Path<String>,
    payload: JsonBody<ArticleRequest>,
) -> JsonResult<ArticleResponse> {
    let id = parse_id(&id)?;
    let Json(request) = payload?;
    request.validate()?;
    let article = update_article_in_db(&pool, user.id, id, request).await?;
    Ok((StatusCode::OK, Json(ArticleResponse::new(article))))
}

pub async fn delete_article(
    Extension(pool): Pool,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, RequestError> {
    delete_article_in_db(&pool, user.id, parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn search_articles(
    Extension(pool): Pool,
    query: QueryString,
) -> JsonResult<Vec<ArticleResponse>> {
    let Query(pairs) = query?;
    let params = SearchParams::from_pairs(&pairs);
    let articles = search_articles_in_db(&pool, params.query()?, params.window()).await?;
    let result = articles.into_iter().map(ArticleResponse::new).collect();
    Ok((StatusCode::OK, Json(result)))
}

// ----------------- Like Handlers -----------------
pub async fn create_like(
    Extension(pool): Pool,
    user: AuthUser,
    payload: JsonBody<LikeRequest>,
) -> JsonResult<LikeResponse> {
    let Json(LikeRequest { article_id }) = payload?;
    let (like, liker, article) = like_article_in_db(&pool, user.id, article_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(LikeResponse::new(like, UserResponse::new(liker), article)),
    ))
}

pub async fn delete_like(
    Extension(pool): Pool,
    user: AuthUser,
    Path(article_id): Path<String>,
) -> Result<StatusCode, RequestError> {
    unlike_article_in_db(&pool, user.id, parse_id(&article_id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_like(
    Extension(pool): Pool,
    user: AuthUser,
    Path(article_id): Path<String>,
) -> JsonResult<LikeResponse> {
    let (like, liker, article) = get_like_in_db(&pool, user.id, parse_id(&article_id)?).await?;
    Ok((
        StatusCode::OK,
        Json(LikeResponse::new(like, UserResponse::new(liker), article)),
    ))
}

pub async fn list_likes(
    Extension(pool): Pool,
    user: AuthUser,
    query: QueryString,
) -> JsonResult<Vec<LikeResponse>> {
    let Query(pairs) = query?;
    let window = WindowParams::from_pairs(&pairs).window();
    let (liker, likes) = list_likes_in_db(&pool, user.id, window).await?;
    let liker = UserResponse::new(liker);
    let result = likes
        .into_iter()
        .map(|(like, article)| LikeResponse::new(like, liker.clone(), article))
        .collect();
    Ok((StatusCode::OK, Json(result)))
}

// ----------------- Comment Handlers -----------------
pub async fn create_comment(
    Extension(pool): Pool,
    user: AuthUser,
    Path(article_id): Path<String>,
    payload: JsonBody<CommentRequest>,
) -> JsonResult<CommentResponse> {
    let article_id = parse_id(&article_id)?;
    let Json(request) = payload?;
    request.validate()?;
    let (comment, article) =
        add_comment_to_article_in_db(&pool, user.id, article_id, request).await?;
    Ok((StatusCode::CREATED, Json(CommentResponse::new(comment, article))))
}

pub async fn update_comment(
    Extension(pool): Pool,
    user: AuthUser,
    Path(comment_id): Path<String>,
    payload: JsonBody<CommentRequest>,
) -> JsonResult<CommentResponse> {
    let comment_id = parse_id(&comment_id)?;
    let Json(request) = payload?;
    request.validate()?;
    let (comment, article) = update_comment_in_db(&pool, user.id, comment_id, request).await?;
    Ok((StatusCode::OK, Json(CommentResponse::new(comment, article))))
}

pub async fn delete_comment(
    Extension(pool): Pool,
    user: AuthUser,
    Path(comment_id): Path<String>,
) -> Result<StatusCode, RequestError> {
    delete_comment_in_db(&pool, user.id, parse_id(&comment_id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_my_comments(
    Extension(pool): Pool,
    user: AuthUser,
    query: QueryString,
) -> JsonResult<Vec<CommentResponse>> {
    let Query(pairs) = query?;
    let window = WindowParams::from_pairs(&pairs).window();
    let comments = get_comments_by_user_in_db(&pool, user.id, window).await?;
    let result = comments
        .into_iter()
        .map(|(comment, article)| CommentResponse::new(comment, article))
        .collect();
    Ok((StatusCode::OK, Json(result)))
}

pub async fn list_article_comments(
    Extension(pool): Pool,
    _: AuthUser,
    Path(article_id): Path<String>,
    query: QueryString,
) -> JsonResult<Vec<CommentResponse>> {
    let Query(pairs) = query?;
    let window = WindowParams::from_pairs(&pairs).window();
    let (article, comments) =
        get_comments_for_article_in_db(&pool, parse_id(&article_id)?, window).await?;
    let result = comments
        .into_iter()
        .map(|comment| CommentResponse::new(comment, article.clone()))
        .collect();
    Ok((StatusCode::OK, Json(result)))
}
