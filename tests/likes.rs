mod common;

use common::{error_of, spawn_app};
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn liking_twice_is_a_client_error_and_keeps_one_row() {
    let app = spawn_app().await;
    let author = app.user("a").await;
    let fan = app.user("b").await;
    let article = app.create_article(&author, "T", "C").await;

    let first = app
        .post("/api/likes")
        .header("Authorization", &fan)
        .json(&json!({"article_id": article["id"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);
    let like: Value = first.json().await.unwrap();
    assert_eq!(like["user"]["username"], "b");
    assert_eq!(like["article"]["author"]["username"], "a");
    assert_eq!(like["article"]["likes"], 1);
    assert!(like["liked_at"].as_str().is_some());

    let second = app
        .post("/api/likes")
        .header("Authorization", &fan)
        .json(&json!({"article_id": article["id"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(second).await, "AlreadyLiked");

    let likes: Vec<Value> = app
        .get("/api/likes")
        .header("Authorization", &fan)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(likes.len(), 1);
    assert_eq!(likes[0]["article"]["likes"], 1);
}

#[tokio::test]
async fn concurrent_duplicate_likes_yield_one_success() {
    let app = spawn_app().await;
    let author = app.user("a").await;
    let fan = app.user("b").await;
    let article = app.create_article(&author, "T", "C").await;

    let attempt = || {
        app.post("/api/likes")
            .header("Authorization", &fan)
            .json(&json!({"article_id": article["id"]}))
            .send()
    };
    let (left, right) = tokio::join!(attempt(), attempt());
    let mut statuses = vec![left.unwrap().status(), right.unwrap().status()];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::BAD_REQUEST]);
}

#[tokio::test]
async fn anyone_may_like_their_own_article() {
    let app = spawn_app().await;
    let author = app.user("a").await;
    let article = app.create_article(&author, "T", "C").await;
    let response = app
        .post("/api/likes")
        .header("Authorization", &author)
        .json(&json!({"article_id": article["id"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn liking_a_missing_article_is_not_found() {
    let app = spawn_app().await;
    let token = app.user("a").await;
    let response = app
        .post("/api/likes")
        .header("Authorization", &token)
        .json(&json!({"article_id": 4242}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_of(response).await, "Article not found");
}

#[tokio::test]
async fn unlike_then_like_again() {
    let app = spawn_app().await;
    let author = app.user("a").await;
    let fan = app.user("b").await;
    let article = app.create_article(&author, "T", "C").await;
    let like_path = format!("/api/like/{}", article["id"]);

    let created = app
        .post("/api/likes")
        .header("Authorization", &fan)
        .json(&json!({"article_id": article["id"]}))
        .send()
        .await
        .unwrap();
    let first: Value = created.json().await.unwrap();

    let mine = app
        .get(&like_path)
        .header("Authorization", &fan)
        .send()
        .await
        .unwrap();
    assert_eq!(mine.status(), StatusCode::OK);

    let removed = app
        .delete(&like_path)
        .header("Authorization", &fan)
        .send()
        .await
        .unwrap();
    assert_eq!(removed.status(), StatusCode::NO_CONTENT);

    let gone = app
        .get(&like_path)
        .header("Authorization", &fan)
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);

    let twice = app
        .delete(&like_path)
        .header("Authorization", &fan)
        .send()
        .await
        .unwrap();
    assert_eq!(twice.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_of(twice).await, "Like not found");

    let again = app
        .post("/api/likes")
        .header("Authorization", &fan)
        .json(&json!({"article_id": article["id"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::CREATED);
    let second: Value = again.json().await.unwrap();
    assert_ne!(first["id"], second["id"]);
    assert_eq!(second["article"]["likes"], 1);
}

#[tokio::test]
async fn users_only_remove_their_own_likes() {
    let app = spawn_app().await;
    let author = app.user("a").await;
    let fan = app.user("b").await;
    let article = app.create_article(&author, "T", "C").await;
    app.post("/api/likes")
        .header("Authorization", &fan)
        .json(&json!({"article_id": article["id"]}))
        .send()
        .await
        .unwrap();

    let response = app
        .delete(&format!("/api/like/{}", article["id"]))
        .header("Authorization", &author)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn likes_on_deleted_articles_drop_out_of_the_listing() {
    let app = spawn_app().await;
    let author = app.user("a").await;
    let fan = app.user("b").await;
    let kept = app.create_article(&author, "kept", "C").await;
    let dropped = app.create_article(&author, "dropped", "C").await;
    for article in [&kept, &dropped] {
        app.post("/api/likes")
            .header("Authorization", &fan)
            .json(&json!({"article_id": article["id"]}))
            .send()
            .await
            .unwrap();
    }
    app.delete(&format!("/api/article/{}", dropped["id"]))
        .header("Authorization", &author)
        .send()
        .await
        .unwrap();

    let likes: Vec<Value> = app
        .get("/api/likes")
        .header("Authorization", &fan)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(likes.len(), 1);
    assert_eq!(likes[0]["article"]["title"], "kept");
}
