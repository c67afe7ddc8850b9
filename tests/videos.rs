use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use serde_json::Value;

mod common;
use common::{account, data, seed_video, spawn, spawn_with, stored_files, upload_form, Authorized, FailingThumbnails};

#[tokio::test]
async fn lists_the_first_page_of_published_videos() {
    let app = spawn().await;
    let owner = account(&app, "pagination").await;
    for n in 0..25 {
        seed_video(&app, &owner, &format!("video {n}")).await;
    }

    let response = app.server.get("/api/v1/videos").await;
    response.assert_status_ok();

    let page = data(&response);
    assert_eq!(page["videos"].as_array().unwrap().len(), 10);
    assert_eq!(page["totalVideos"], 25);
    assert_eq!(page["page"], 1);
    assert_eq!(page["limit"], 10);
    assert_eq!(page["totalPages"], 3);
    assert_eq!(page["hasNextPage"], true);
    assert_eq!(page["hasPrevPage"], false);
    assert_eq!(page["nextPage"], 2);

    let last = app
        .server
        .get("/api/v1/videos")
        .add_query_param("page", 3)
        .add_query_param("limit", 10)
        .await;
    let page = data(&last);
    assert_eq!(page["videos"].as_array().unwrap().len(), 5);
    assert_eq!(page["hasNextPage"], false);
    assert_eq!(page["nextPage"], Value::Null);
}

#[tokio::test]
async fn empty_listing_still_answers_with_a_page() {
    let app = spawn().await;

    let response = app.server.get("/api/v1/videos").await;
    response.assert_status_ok();

    let body = response.json::<Value>();
    assert_eq!(body["message"], "No videos found");
    assert_eq!(body["data"]["videos"], serde_json::json!([]));
    assert_eq!(body["data"]["totalVideos"], 0);
    assert_eq!(body["data"]["totalPages"], 1);
}

#[tokio::test]
async fn rejects_page_zero() {
    let app = spawn().await;

    let response = app.server.get("/api/v1/videos").add_query_param("page", 0).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["success"], false);
}

#[tokio::test]
async fn searches_titles_and_descriptions_case_insensitively() {
    let app = spawn().await;
    let owner = account(&app, "searcher").await;
    seed_video(&app, &owner, "Learning Rust").await;
    seed_video(&app, &owner, "Baking bread").await;

    let response = app.server.get("/api/v1/videos").add_query_param("query", "rUsT").await;
    let page = data(&response);

    assert_eq!(page["totalVideos"], 1);
    assert_eq!(page["videos"][0]["title"], "Learning Rust");
}

#[tokio::test]
async fn sorts_by_the_requested_key() {
    let app = spawn().await;
    let owner = account(&app, "sorter").await;
    for title in ["banana", "cherry", "apple"] {
        seed_video(&app, &owner, title).await;
    }

    let response = app
        .server
        .get("/api/v1/videos")
        .add_query_param("sortBy", "title")
        .add_query_param("sortType", "asc")
        .await;
    let titles: Vec<Value> = data(&response)["videos"]
        .as_array()
        .unwrap()
        .iter()
        .map(|video| video["title"].clone())
        .collect();

    assert_eq!(titles, vec!["apple", "banana", "cherry"]);
}

#[tokio::test]
async fn unpublished_videos_are_only_listed_for_their_owner() {
    let app = spawn().await;
    let owner = account(&app, "drafter").await;
    let video = seed_video(&app, &owner, "draft").await;

    let toggled = app
        .server
        .patch(&format!("/api/v1/videos/{}/publish", video.id))
        .as_user(&owner)
        .await;
    toggled.assert_status_ok();
    assert_eq!(data(&toggled)["isPublished"], false);

    let public = app.server.get("/api/v1/videos").await;
    assert_eq!(data(&public)["totalVideos"], 0);

    let own = app
        .server
        .get("/api/v1/videos")
        .add_query_param("userId", owner.id.to_string())
        .as_user(&owner)
        .await;
    assert_eq!(data(&own)["totalVideos"], 1);
}

#[tokio::test]
async fn publishes_an_uploaded_video() {
    let app = spawn().await;
    let owner = account(&app, "uploader").await;

    let response = app
        .server
        .post("/api/v1/videos")
        .as_user(&owner)
        .multipart(upload_form("first upload"))
        .await;
    response.assert_status(StatusCode::CREATED);

    let video = data(&response);
    assert_eq!(video["title"], "first upload");
    assert_eq!(video["duration"], 12.5);
    assert_eq!(video["views"], 0);
    assert_eq!(video["isPublished"], true);
    assert_eq!(video["owner"]["username"], "uploader");
    assert!(video["videoFile"]["url"].as_str().unwrap().starts_with("http://localhost:8000/media/videos/"));
    assert_eq!(stored_files(&app, "videos"), 1);
    assert_eq!(stored_files(&app, "thumbnails"), 1);
}

#[tokio::test]
async fn rejects_uploads_missing_a_file() {
    let app = spawn().await;
    let owner = account(&app, "forgetful").await;

    let form = MultipartForm::new()
        .add_text("title", "no files")
        .add_text("description", "nothing attached");
    let response = app.server.post("/api/v1/videos").as_user(&owner).multipart(form).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(stored_files(&app, "videos"), 0);
}

#[tokio::test]
async fn cleans_up_the_stored_upload_when_the_other_fails() {
    let store = Arc::new(FailingThumbnails::default());
    let app = spawn_with(store.clone(), tempfile::tempdir().unwrap()).await;
    let owner = account(&app, "unlucky").await;

    let response = app
        .server
        .post("/api/v1/videos")
        .as_user(&owner)
        .multipart(upload_form("doomed"))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let uploaded = store.uploaded.lock().unwrap().clone();
    let deleted = store.deleted.lock().unwrap().clone();
    assert_eq!(uploaded.len(), 1);
    assert_eq!(deleted, uploaded);

    let listing = app.server.get("/api/v1/videos").await;
    assert_eq!(data(&listing)["totalVideos"], 0);
}

#[tokio::test]
async fn only_the_owner_may_update_even_with_an_invalid_payload() {
    let app = spawn().await;
    let owner = account(&app, "owner").await;
    let intruder = account(&app, "intruder").await;
    let video = seed_video(&app, &owner, "mine").await;

    let response = app
        .server
        .patch(&format!("/api/v1/videos/{}", video.id))
        .as_user(&intruder)
        .multipart(MultipartForm::new().add_text("title", "   "))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let unchanged = app.server.get(&format!("/api/v1/videos/{}", video.id)).await;
    assert_eq!(data(&unchanged)["title"], "mine");
}

#[tokio::test]
async fn only_the_owner_may_delete() {
    let app = spawn().await;
    let owner = account(&app, "proprietor").await;
    let intruder = account(&app, "vandal").await;
    let video = seed_video(&app, &owner, "protected").await;

    app.server
        .delete(&format!("/api/v1/videos/{}", video.id))
        .as_user(&intruder)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    app.server
        .get(&format!("/api/v1/videos/{}", video.id))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn replacing_the_thumbnail_deletes_the_old_one() {
    let app = spawn().await;
    let owner = account(&app, "redesigner").await;

    let uploaded = app
        .server
        .post("/api/v1/videos")
        .as_user(&owner)
        .multipart(upload_form("new look"))
        .await;
    let video = data(&uploaded);
    let id = video["id"].as_str().unwrap().to_string();

    let form = MultipartForm::new()
        .add_part("thumbnail", Part::bytes(b"a better cover".as_slice()).file_name("cover.jpg").mime_type("image/jpeg"));
    let updated = app
        .server
        .patch(&format!("/api/v1/videos/{id}"))
        .as_user(&owner)
        .multipart(form)
        .await;
    updated.assert_status_ok();

    let thumbnail = &data(&updated)["thumbnail"];
    assert_ne!(thumbnail["public_id"], video["thumbnail"]["public_id"]);
    assert!(thumbnail["url"].as_str().unwrap().ends_with(".jpg"));
    assert_eq!(stored_files(&app, "thumbnails"), 1);
    assert_eq!(stored_files(&app, "videos"), 1);
}

#[tokio::test]
async fn failed_record_write_deletes_both_uploads() {
    let app = spawn().await;
    let owner = account(&app, "rejected").await;
    app.database
        .query("DEFINE FIELD title ON videos TYPE string ASSERT $value != 'refused'")
        .await
        .unwrap()
        .check()
        .unwrap();

    let response = app
        .server
        .post("/api/v1/videos")
        .as_user(&owner)
        .multipart(upload_form("refused"))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    assert_eq!(stored_files(&app, "videos"), 0);
    assert_eq!(stored_files(&app, "thumbnails"), 0);
}

#[tokio::test]
async fn unreachable_page_is_a_bad_request() {
    let app = spawn().await;

    for page in ["1000000000000000000", "9223372036854775807", "18446744073709551615"] {
        let response = app
            .server
            .get("/api/v1/videos")
            .add_query_param("page", page)
            .add_query_param("limit", 10)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn updates_title_and_description() {
    let app = spawn().await;
    let owner = account(&app, "editor").await;
    let video = seed_video(&app, &owner, "before").await;

    let response = app
        .server
        .patch(&format!("/api/v1/videos/{}", video.id))
        .as_user(&owner)
        .multipart(MultipartForm::new().add_text("title", "after"))
        .await;
    response.assert_status_ok();

    let updated = data(&response);
    assert_eq!(updated["title"], "after");
    assert_eq!(updated["description"], "about before");
}

#[tokio::test]
async fn views_count_and_history_keeps_each_video_once() {
    let app = spawn().await;
    let owner = account(&app, "creator").await;
    let viewer = account(&app, "viewer").await;
    let first = seed_video(&app, &owner, "first").await;
    let second = seed_video(&app, &owner, "second").await;

    for video in [&first, &second, &first] {
        app.server
            .post(&format!("/api/v1/videos/{}/views", video.id))
            .as_user(&viewer)
            .await
            .assert_status_ok();
    }

    let found = app.server.get(&format!("/api/v1/videos/{}", first.id)).await;
    assert_eq!(data(&found)["views"], 2);

    let history = app.server.get("/api/v1/history").as_user(&viewer).await;
    let ids: Vec<String> = data(&history)
        .as_array()
        .unwrap()
        .iter()
        .map(|video| video["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec![first.id.to_string(), second.id.to_string()]);
}

#[tokio::test]
async fn deleting_a_video_removes_everything_attached_to_it() {
    let app = spawn().await;
    let owner = account(&app, "deleter").await;
    let viewer = account(&app, "fan").await;

    let uploaded = app
        .server
        .post("/api/v1/videos")
        .as_user(&owner)
        .multipart(upload_form("short lived"))
        .await;
    let video_id = data(&uploaded)["id"].as_str().unwrap().to_string();

    app.server
        .post(&format!("/api/v1/videos/{video_id}/views"))
        .as_user(&viewer)
        .await
        .assert_status_ok();
    app.server
        .post(&format!("/api/v1/likes/videos/{video_id}"))
        .as_user(&viewer)
        .await
        .assert_status_ok();
    let comment = app
        .server
        .post(&format!("/api/v1/videos/{video_id}/comments"))
        .as_user(&viewer)
        .json(&serde_json::json!({ "content": "great video" }))
        .await;
    let comment_id = data(&comment)["id"].as_str().unwrap().to_string();
    app.server
        .post(&format!("/api/v1/likes/comments/{comment_id}"))
        .as_user(&owner)
        .await
        .assert_status_ok();
    let playlist = app
        .server
        .post("/api/v1/playlists")
        .as_user(&viewer)
        .json(&serde_json::json!({ "name": "favourites" }))
        .await;
    let playlist_id = data(&playlist)["id"].as_str().unwrap().to_string();
    app.server
        .put(&format!("/api/v1/playlists/{playlist_id}/videos/{video_id}"))
        .as_user(&viewer)
        .await
        .assert_status_ok();

    app.server
        .delete(&format!("/api/v1/videos/{video_id}"))
        .as_user(&owner)
        .await
        .assert_status_ok();

    app.server
        .get(&format!("/api/v1/videos/{video_id}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let detail = app.server.get(&format!("/api/v1/playlists/{playlist_id}")).await;
    assert_eq!(data(&detail)["totalVideos"], 0);
    assert_eq!(data(&detail)["videos"], serde_json::json!([]));

    let history = app.server.get("/api/v1/history").as_user(&viewer).await;
    assert_eq!(data(&history), serde_json::json!([]));

    let mut likes = app.database.query("SELECT VALUE meta::id(id) FROM likes").await.unwrap();
    let remaining: Vec<String> = likes.take(0).unwrap();
    assert!(remaining.is_empty(), "{remaining:?}");

    let mut comments = app.database.query("SELECT VALUE meta::id(id) FROM comments").await.unwrap();
    let remaining: Vec<String> = comments.take(0).unwrap();
    assert!(remaining.is_empty(), "{remaining:?}");

    assert_eq!(stored_files(&app, "videos"), 0);
    assert_eq!(stored_files(&app, "thumbnails"), 0);
}

#[tokio::test]
async fn unknown_and_malformed_ids() {
    let app = spawn().await;

    app.server
        .get(&format!("/api/v1/videos/{}", uuid::Uuid::new_v4()))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let malformed = app.server.get("/api/v1/videos/not-a-uuid").await;
    malformed.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(malformed.json::<Value>()["statusCode"], 400);
}
