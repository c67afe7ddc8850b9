use axum::extract::State;
use axum::routing::{get, patch};
use axum::Router;
use snafu::{ensure, OptionExt, ResultExt};
use tracing::instrument;

use crate::auth::CurrentUser;
use crate::database::{Page, Record};
use crate::model::{Comment, User, Video};

use super::{
    content, ApiError, ApiJson, ApiPath, ApiQuery, ApiResponse, App, ContentBody, DatabaseSnafu, Deleted,
    ForbiddenSnafu, NotFoundSnafu, PageQuery, Result,
};

pub fn routes() -> Router<App> {
    Router::new()
        .route("/videos/:id/comments", get(list).post(create))
        .route("/comments/:id", patch(update).delete(remove))
}

async fn require_video(app: &App, video: &Record<Video>) -> Result<()> {
    Video::record(video.clone(), &app.database)
        .await
        .context(DatabaseSnafu)?
        .context(NotFoundSnafu { entity: "video" })
        .map(drop)
}

async fn owned(app: &App, id: &Record<Comment>, user: &Record<User>) -> Result<()> {
    let comment = Comment::record(id.clone(), &app.database)
        .await
        .context(DatabaseSnafu)?
        .context(NotFoundSnafu { entity: "comment" })?;

    ensure!(&comment.owner == user, ForbiddenSnafu { entity: "comment" });
    Ok(())
}

#[instrument(skip(app))]
async fn list(
    State(app): State<App>, ApiPath(video): ApiPath<Record<Video>>, ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<ApiResponse<Page<Comment>>> {
    let request = query.request()?;
    require_video(&app, &video).await?;

    let page = Comment::list_for(&video, request, &app.database).await.context(DatabaseSnafu)?;
    Ok(ApiResponse::ok(page, "comments fetched"))
}

#[instrument(skip(app, body))]
async fn create(
    State(app): State<App>, CurrentUser(user): CurrentUser, ApiPath(video): ApiPath<Record<Video>>,
    ApiJson(body): ApiJson<ContentBody>,
) -> Result<ApiResponse<Comment>> {
    let content = content(&body)?;
    require_video(&app, &video).await?;

    let comment = Comment::create(&video, &user, &content, &app.database)
        .await
        .context(DatabaseSnafu)?;

    Ok(ApiResponse::created(comment, "comment added"))
}

#[instrument(skip(app, body))]
async fn update(
    State(app): State<App>, CurrentUser(user): CurrentUser, ApiPath(id): ApiPath<Record<Comment>>,
    body: Result<ApiJson<ContentBody>, ApiError>,
) -> Result<ApiResponse<Comment>> {
    owned(&app, &id, &user).await?;
    let ApiJson(body) = body?;
    let content = content(&body)?;

    let comment = Comment::update(&id, &content, &app.database).await.context(DatabaseSnafu)?;
    Ok(ApiResponse::ok(comment, "comment updated"))
}

#[instrument(skip(app))]
async fn remove(
    State(app): State<App>, CurrentUser(user): CurrentUser, ApiPath(id): ApiPath<Record<Comment>>,
) -> Result<ApiResponse<Deleted<Comment>>> {
    owned(&app, &id, &user).await?;

    Comment::delete(&id, &app.database).await.context(DatabaseSnafu)?;
    Ok(ApiResponse::ok(Deleted { id }, "comment deleted"))
}
