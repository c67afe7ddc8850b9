use axum::extract::State;
use axum::routing::get;
use axum::Router;
use snafu::ResultExt;
use tracing::instrument;

use crate::auth::CurrentUser;
use crate::model::{ChannelStats, Video};

use super::{ApiResponse, App, DatabaseSnafu, Result};

pub fn routes() -> Router<App> {
    Router::new()
        .route("/dashboard/stats", get(stats))
        .route("/dashboard/videos", get(videos))
}

#[instrument(skip(app))]
async fn stats(State(app): State<App>, CurrentUser(user): CurrentUser) -> Result<ApiResponse<ChannelStats>> {
    let stats = ChannelStats::of(&user, &app.database).await.context(DatabaseSnafu)?;
    Ok(ApiResponse::ok(stats, "channel stats fetched"))
}

/// Every video of the caller, unpublished ones included.
#[instrument(skip(app))]
async fn videos(State(app): State<App>, CurrentUser(user): CurrentUser) -> Result<ApiResponse<Vec<Video>>> {
    let videos = Video::by_owner(&user, &app.database).await.context(DatabaseSnafu)?;
    Ok(ApiResponse::ok(videos, "channel videos fetched"))
}
