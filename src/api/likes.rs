use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use snafu::{ensure, ResultExt};
use tracing::instrument;

use crate::auth::CurrentUser;
use crate::database::Record;
use crate::model::like::LikeToggle;
use crate::model::{Comment, Like, LikeTarget, Tweet, User, Video};

use super::{ApiPath, ApiResponse, App, DatabaseSnafu, NotFoundSnafu, Result};

pub fn routes() -> Router<App> {
    Router::new()
        .route("/likes/videos", get(liked_videos))
        .route("/likes/videos/:id", post(toggle_video))
        .route("/likes/comments/:id", post(toggle_comment))
        .route("/likes/tweets/:id", post(toggle_tweet))
}

async fn toggle(app: &App, target: LikeTarget, user: &Record<User>) -> Result<ApiResponse<LikeToggle>> {
    let exists = Like::target_exists(&target, &app.database).await.context(DatabaseSnafu)?;
    ensure!(exists, NotFoundSnafu { entity: target.kind.as_str() });

    let toggle = Like::toggle(&target, user, &app.database).await.context(DatabaseSnafu)?;
    let message = if toggle.liked { "liked" } else { "like removed" };

    Ok(ApiResponse::ok(toggle, format!("{} {message}", target.kind)))
}

#[instrument(skip(app))]
async fn toggle_video(
    State(app): State<App>, CurrentUser(user): CurrentUser, ApiPath(id): ApiPath<Record<Video>>,
) -> Result<ApiResponse<LikeToggle>> {
    toggle(&app, LikeTarget::video(&id), &user).await
}

#[instrument(skip(app))]
async fn toggle_comment(
    State(app): State<App>, CurrentUser(user): CurrentUser, ApiPath(id): ApiPath<Record<Comment>>,
) -> Result<ApiResponse<LikeToggle>> {
    toggle(&app, LikeTarget::comment(&id), &user).await
}

#[instrument(skip(app))]
async fn toggle_tweet(
    State(app): State<App>, CurrentUser(user): CurrentUser, ApiPath(id): ApiPath<Record<Tweet>>,
) -> Result<ApiResponse<LikeToggle>> {
    toggle(&app, LikeTarget::tweet(&id), &user).await
}

#[instrument(skip(app))]
async fn liked_videos(State(app): State<App>, CurrentUser(user): CurrentUser) -> Result<ApiResponse<Vec<Video>>> {
    let videos = Video::liked_by(&user, &app.database).await.context(DatabaseSnafu)?;
    Ok(ApiResponse::ok(videos, "liked videos fetched"))
}
