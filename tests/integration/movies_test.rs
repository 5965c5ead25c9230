//! Keyset pagination, likes and transactional updates against a real database

mod common;

use std::collections::HashSet;

use axum::http::{Method, StatusCode};
use reelhouse_auth::Role;
use serde_json::{json, Value};

use crate::common::{bearer, TestApp};

/// Walk every page of `GET /movies` for this test's rows
async fn collect_pages(app: &TestApp, order: &str, take: i64) -> Vec<Vec<Value>> {
    let mut pages = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let mut uri = format!("/movies?title={}&order={}&take={}", app.prefix, order, take);
        if let Some(c) = &cursor {
            uri.push_str(&format!("&cursor={}", urlencode(c)));
        }

        let (status, page) = app.request(Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK, "{page}");

        let rows = page["data"].as_array().unwrap().clone();
        if rows.is_empty() {
            assert!(page["nextCursor"].is_null());
            break;
        }
        pages.push(rows);

        cursor = Some(page["nextCursor"].as_str().unwrap().to_string());
        assert!(pages.len() < 50, "pagination does not terminate");
    }

    pages
}

fn urlencode(cursor: &str) -> String {
    cursor
        .replace('+', "%2B")
        .replace('/', "%2F")
        .replace('=', "%3D")
}

async fn toggle(app: &TestApp, movie: i64, action: &str, user: &str) -> (StatusCode, Value) {
    let uri = format!("/movies/{movie}/{action}");
    app.request(Method::POST, &uri, Some(user.to_string()), None).await
}

fn ids(rows: &[Value]) -> Vec<i64> {
    rows.iter().map(|r| r["id"].as_i64().unwrap()).collect()
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database (TEST_DATABASE_URL)"]
async fn test_descending_id_pages_do_not_overlap() {
    let app = TestApp::new().await.unwrap();
    let director = app.seed_director("Director").await.unwrap();
    for i in 0..12 {
        app.seed_movie(&format!("movie {i}"), director, 0).await.unwrap();
    }

    let pages = collect_pages(&app, "id_DESC", 5).await;
    assert_eq!(pages.iter().map(Vec::len).collect::<Vec<_>>(), vec![5, 5, 2]);

    let all: Vec<i64> = pages.iter().flat_map(|p| ids(p)).collect();
    assert!(all.windows(2).all(|w| w[0] > w[1]));
    assert_eq!(all.iter().collect::<HashSet<_>>().len(), 12);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database (TEST_DATABASE_URL)"]
async fn test_multi_column_order_visits_every_row_once() {
    let app = TestApp::new().await.unwrap();
    let director = app.seed_director("Director").await.unwrap();
    for (i, likes) in [3, 1, 3, 2, 1, 3, 2].into_iter().enumerate() {
        app.seed_movie(&format!("movie {i}"), director, likes).await.unwrap();
    }

    let pages = collect_pages(&app, "likeCount_ASC,id_ASC", 2).await;
    let rows: Vec<(i64, i64)> = pages
        .iter()
        .flatten()
        .map(|r| (r["likeCount"].as_i64().unwrap(), r["id"].as_i64().unwrap()))
        .collect();

    assert_eq!(rows.len(), 7);
    assert!(rows.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database (TEST_DATABASE_URL)"]
async fn test_listing_count_and_cursor_order() {
    let app = TestApp::new().await.unwrap();
    let director = app.seed_director("Director").await.unwrap();
    for i in 0..4 {
        app.seed_movie(&format!("movie {i}"), director, i).await.unwrap();
    }

    let uri = format!("/movies?title={}&order=likeCount_DESC&take=2", app.prefix);
    let (_, first) = app.request(Method::GET, &uri, None, None).await;
    assert_eq!(first["count"], 4);
    assert_eq!(first["data"][0]["likeCount"], 3);

    // The cursor's own order wins over a conflicting client order
    let cursor = urlencode(first["nextCursor"].as_str().unwrap());
    let uri = format!(
        "/movies?title={}&order=id_ASC&take=2&cursor={}",
        app.prefix, cursor
    );
    let (status, second) = app.request(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["count"], 4);
    let likes: Vec<i64> = second["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["likeCount"].as_i64().unwrap())
        .collect();
    assert_eq!(likes, vec![1, 0]);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database (TEST_DATABASE_URL)"]
async fn test_get_movie_detail() {
    let app = TestApp::new().await.unwrap();
    let director = app.seed_director("Director").await.unwrap();
    let genre = app.seed_genre("drama").await.unwrap();
    let movie = app.seed_movie("detail", director, 0).await.unwrap();
    app.link_genre(movie, genre).await.unwrap();

    let (status, body) = app
        .request(Method::GET, &format!("/movies/{movie}"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "About detail");
    assert_eq!(body["director"]["id"], director);
    assert_eq!(body["genres"][0]["id"], genre);

    let (status, _) = app
        .request(Method::GET, "/movies/9223372036854775807", None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database (TEST_DATABASE_URL)"]
async fn test_update_is_all_or_nothing() {
    let app = TestApp::new().await.unwrap();
    let director = app.seed_director("Director").await.unwrap();
    let other_director = app.seed_director("Other").await.unwrap();
    let drama = app.seed_genre("drama").await.unwrap();
    let thriller = app.seed_genre("thriller").await.unwrap();
    let movie = app.seed_movie("before", director, 0).await.unwrap();
    app.link_genre(movie, drama).await.unwrap();
    let admin = bearer(&app.token(Role::Admin));
    let uri = format!("/movies/{movie}");

    // Unknown genre: nothing changes
    let (status, _) = app
        .request(
            Method::PATCH,
            &uri,
            Some(admin.clone()),
            Some(json!({
                "title": format!("{} after", app.prefix),
                "genreIds": [thriller, i64::MAX],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, unchanged) = app.request(Method::GET, &uri, None, None).await;
    assert_eq!(unchanged["title"], format!("{} before", app.prefix));
    assert_eq!(unchanged["genres"][0]["id"], drama);

    // Unknown director: nothing changes either
    let (status, _) = app
        .request(
            Method::PATCH,
            &uri,
            Some(admin.clone()),
            Some(json!({ "directorId": i64::MAX, "detail": "rewritten" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, updated) = app
        .request(
            Method::PATCH,
            &uri,
            Some(admin),
            Some(json!({
                "title": format!("{} after", app.prefix),
                "detail": "rewritten",
                "directorId": other_director,
                "genreIds": [thriller, drama, thriller],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], format!("{} after", app.prefix));
    assert_eq!(updated["detail"], "rewritten");
    assert_eq!(updated["director"]["id"], other_director);
    let genre_ids: HashSet<i64> = updated["genres"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["id"].as_i64().unwrap())
        .collect();
    assert_eq!(genre_ids, HashSet::from([drama, thriller]));
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database (TEST_DATABASE_URL)"]
async fn test_like_toggles_status_and_counters() {
    let app = TestApp::new().await.unwrap();
    let director = app.seed_director("Director").await.unwrap();
    let movie = app.seed_movie("liked", director, 0).await.unwrap();
    let user = bearer(&app.registered_user_token("fan").await);
    let uri = format!("/movies/{movie}");

    let (status, body) = toggle(&app, movie, "like", &user).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "isLike": true }));

    let (_, detail) = app.request(Method::GET, &uri, Some(user.clone()), None).await;
    assert_eq!(detail["likeStatus"], true);
    assert_eq!(detail["likeCount"], 1);
    assert_eq!(detail["dislikeCount"], 0);

    // The other button flips the reaction
    let (_, body) = toggle(&app, movie, "dislike", &user).await;
    assert_eq!(body, json!({ "isLike": false }));

    let (_, detail) = app.request(Method::GET, &uri, Some(user.clone()), None).await;
    assert_eq!(detail["likeStatus"], false);
    assert_eq!(detail["likeCount"], 0);
    assert_eq!(detail["dislikeCount"], 1);

    // The same button again withdraws it
    let (_, body) = toggle(&app, movie, "dislike", &user).await;
    assert_eq!(body, json!({ "isLike": null }));

    let (_, detail) = app.request(Method::GET, &uri, Some(user), None).await;
    assert!(detail["likeStatus"].is_null());
    assert_eq!(detail["likeCount"], 0);
    assert_eq!(detail["dislikeCount"], 0);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database (TEST_DATABASE_URL)"]
async fn test_listing_shows_callers_own_like_status() {
    let app = TestApp::new().await.unwrap();
    let director = app.seed_director("Director").await.unwrap();
    let liked = app.seed_movie("liked", director, 0).await.unwrap();
    let disliked = app.seed_movie("disliked", director, 0).await.unwrap();
    let untouched = app.seed_movie("untouched", director, 0).await.unwrap();

    let fan = bearer(&app.registered_user_token("fan").await);
    let other = bearer(&app.registered_user_token("other").await);
    toggle(&app, liked, "like", &fan).await;
    toggle(&app, disliked, "dislike", &fan).await;

    let uri = format!("/movies?title={}&take=10", app.prefix);
    let status_of = |page: &Value, id: i64| {
        page["data"]
            .as_array()
            .unwrap()
            .iter()
            .find(|m| m["id"] == id)
            .map(|m| m["likeStatus"].clone())
            .unwrap()
    };

    let (_, page) = app.request(Method::GET, &uri, Some(fan), None).await;
    assert_eq!(status_of(&page, liked), json!(true));
    assert_eq!(status_of(&page, disliked), json!(false));
    assert_eq!(status_of(&page, untouched), Value::Null);

    // Reactions are per caller
    let (_, page) = app.request(Method::GET, &uri, Some(other), None).await;
    assert_eq!(status_of(&page, liked), Value::Null);

    let (_, page) = app.request(Method::GET, &uri, None, None).await;
    assert_eq!(status_of(&page, liked), Value::Null);
    assert_eq!(status_of(&page, disliked), Value::Null);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database (TEST_DATABASE_URL)"]
async fn test_like_rejects_unknown_movie_and_user() {
    let app = TestApp::new().await.unwrap();
    let director = app.seed_director("Director").await.unwrap();
    let movie = app.seed_movie("lonely", director, 0).await.unwrap();
    let user = bearer(&app.registered_user_token("fan").await);

    let (status, _) = app
        .request(Method::POST, "/movies/9223372036854775807/like", Some(user), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // A valid token whose user row does not exist
    let ghost = bearer(&app.token(Role::User));
    let (status, _) = app
        .request(Method::POST, &format!("/movies/{movie}/like"), Some(ghost), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, detail) = app
        .request(Method::GET, &format!("/movies/{movie}"), None, None)
        .await;
    assert_eq!(detail["likeCount"], 0);
}
