use axum::http::StatusCode;
use serde_json::{json, Value};

mod common;
use common::{account, data, seed_video, spawn, Authorized};

#[tokio::test]
async fn dashboard_totals_the_channel() {
    let app = spawn().await;
    let channel = account(&app, "studio").await;
    let fan = account(&app, "regular").await;
    let first = seed_video(&app, &channel, "episode 1").await;
    seed_video(&app, &channel, "episode 2").await;

    for _ in 0..3 {
        app.server
            .post(&format!("/api/v1/videos/{}/views", first.id))
            .as_user(&fan)
            .await
            .assert_status_ok();
    }
    app.server
        .post(&format!("/api/v1/likes/videos/{}", first.id))
        .as_user(&fan)
        .await
        .assert_status_ok();
    app.server
        .post(&format!("/api/v1/videos/{}/comments", first.id))
        .as_user(&fan)
        .json(&json!({ "content": "more please" }))
        .await
        .assert_status(StatusCode::CREATED);
    app.server
        .post(&format!("/api/v1/subscriptions/channels/{}", channel.id))
        .as_user(&fan)
        .await
        .assert_status_ok();
    app.server
        .post("/api/v1/tweets")
        .as_user(&channel)
        .json(&json!({ "content": "new episode out" }))
        .await
        .assert_status(StatusCode::CREATED);

    let stats = app.server.get("/api/v1/dashboard/stats").as_user(&channel).await;
    stats.assert_status_ok();
    assert_eq!(
        data(&stats),
        json!({
            "totalVideos": 2,
            "totalViews": 3,
            "totalSubscribers": 1,
            "totalSubscribedTo": 0,
            "totalLikes": 1,
            "totalComments": 1,
            "totalTweets": 1,
        })
    );
}

#[tokio::test]
async fn dashboard_of_an_empty_channel_is_all_zero() {
    let app = spawn().await;
    let channel = account(&app, "newcomer").await;

    let stats = app.server.get("/api/v1/dashboard/stats").as_user(&channel).await;
    stats.assert_status_ok();
    assert!(data(&stats).as_object().unwrap().values().all(|total| total == 0));
}

#[tokio::test]
async fn dashboard_videos_include_unpublished_ones() {
    let app = spawn().await;
    let channel = account(&app, "perfectionist").await;
    let draft = seed_video(&app, &channel, "draft").await;
    seed_video(&app, &channel, "released").await;

    app.server
        .patch(&format!("/api/v1/videos/{}/publish", draft.id))
        .as_user(&channel)
        .await
        .assert_status_ok();

    let videos = app.server.get("/api/v1/dashboard/videos").as_user(&channel).await;
    assert_eq!(data(&videos).as_array().unwrap().len(), 2);

    app.server
        .get("/api/v1/dashboard/videos")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn healthcheck_reports_the_database() {
    let app = spawn().await;

    let response = app.server.get("/api/v1/healthcheck").await;
    response.assert_status_ok();

    let body = response.json::<Value>();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["database"], "up");
    assert!(body["data"]["timestamp"].is_string());
}
