use axum::extract::State;
use axum::routing::{get, post, put};
use axum::Router;
use serde::Deserialize;
use snafu::{ensure, OptionExt, ResultExt};
use tracing::instrument;

use crate::auth::CurrentUser;
use crate::database::Record;
use crate::model::playlist::{PlaylistChanges, PlaylistDetail};
use crate::model::{non_blank, Playlist, User, Video};

use super::{
    ApiError, ApiJson, ApiPath, ApiResponse, App, DatabaseSnafu, Deleted, ForbiddenSnafu, NotFoundSnafu, Result,
    ValidationSnafu,
};

pub fn routes() -> Router<App> {
    Router::new()
        .route("/playlists", post(create))
        .route("/playlists/:id", get(find).patch(update).delete(remove))
        .route("/playlists/:id/videos/:video_id", put(add_video).delete(remove_video))
        .route("/users/:id/playlists", get(by_owner))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaylistBody {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

async fn owned(app: &App, id: &Record<Playlist>, user: &Record<User>) -> Result<()> {
    let playlist = Playlist::record(id.clone(), &app.database)
        .await
        .context(DatabaseSnafu)?
        .context(NotFoundSnafu { entity: "playlist" })?;

    ensure!(&playlist.owner == user, ForbiddenSnafu { entity: "playlist" });
    Ok(())
}

/// Playlist and video must both exist before ownership is checked.
async fn owned_with_video(
    app: &App, id: &Record<Playlist>, video: &Record<Video>, user: &Record<User>,
) -> Result<()> {
    let playlist = Playlist::record(id.clone(), &app.database)
        .await
        .context(DatabaseSnafu)?
        .context(NotFoundSnafu { entity: "playlist" })?;
    Video::record(video.clone(), &app.database)
        .await
        .context(DatabaseSnafu)?
        .context(NotFoundSnafu { entity: "video" })?;

    ensure!(&playlist.owner == user, ForbiddenSnafu { entity: "playlist" });
    Ok(())
}

#[instrument(skip(app))]
async fn create(
    State(app): State<App>, CurrentUser(user): CurrentUser, ApiJson(body): ApiJson<PlaylistBody>,
) -> Result<ApiResponse<Playlist>> {
    let name = body
        .name
        .as_deref()
        .and_then(non_blank)
        .context(ValidationSnafu { message: "name is required" })?;
    let description = body.description.as_deref().map(str::trim).unwrap_or_default();

    let playlist = Playlist::create(&user, name, description, &app.database)
        .await
        .context(DatabaseSnafu)?;
    Ok(ApiResponse::created(playlist, "playlist created"))
}

#[instrument(skip(app))]
async fn by_owner(State(app): State<App>, ApiPath(owner): ApiPath<Record<User>>) -> Result<ApiResponse<Vec<Playlist>>> {
    let exists = User::exists(&owner, &app.database).await.context(DatabaseSnafu)?;
    ensure!(exists, NotFoundSnafu { entity: "user" });

    let playlists = Playlist::by_owner(&owner, &app.database).await.context(DatabaseSnafu)?;
    Ok(ApiResponse::ok(playlists, "playlists fetched"))
}

#[instrument(skip(app))]
async fn find(State(app): State<App>, ApiPath(id): ApiPath<Record<Playlist>>) -> Result<ApiResponse<PlaylistDetail>> {
    let playlist = Playlist::detail(&id, &app.database)
        .await
        .context(DatabaseSnafu)?
        .context(NotFoundSnafu { entity: "playlist" })?;

    Ok(ApiResponse::ok(playlist, "playlist fetched"))
}

#[instrument(skip(app))]
async fn update(
    State(app): State<App>, CurrentUser(user): CurrentUser, ApiPath(id): ApiPath<Record<Playlist>>,
    body: Result<ApiJson<PlaylistBody>, ApiError>,
) -> Result<ApiResponse<Playlist>> {
    owned(&app, &id, &user).await?;
    let ApiJson(body) = body?;

    let name = match body.name {
        Some(name) => Some(
            non_blank(&name)
                .map(str::to_string)
                .context(ValidationSnafu { message: "name cannot be blank" })?,
        ),
        None => None,
    };
    let changes = PlaylistChanges {
        name,
        description: body.description.map(|description| description.trim().to_string()),
    };
    ensure!(!changes.is_empty(), ValidationSnafu { message: "provide a name or description to update" });

    let playlist = Playlist::update(&id, changes, &app.database).await.context(DatabaseSnafu)?;
    Ok(ApiResponse::ok(playlist, "playlist updated"))
}

#[instrument(skip(app))]
async fn remove(
    State(app): State<App>, CurrentUser(user): CurrentUser, ApiPath(id): ApiPath<Record<Playlist>>,
) -> Result<ApiResponse<Deleted<Playlist>>> {
    owned(&app, &id, &user).await?;

    Playlist::delete(&id, &app.database).await.context(DatabaseSnafu)?;
    Ok(ApiResponse::ok(Deleted { id }, "playlist deleted"))
}

#[instrument(skip(app))]
async fn add_video(
    State(app): State<App>, CurrentUser(user): CurrentUser,
    ApiPath((id, video)): ApiPath<(Record<Playlist>, Record<Video>)>,
) -> Result<ApiResponse<Playlist>> {
    owned_with_video(&app, &id, &video, &user).await?;

    let playlist = Playlist::add_video(&id, &video, &app.database)
        .await
        .context(DatabaseSnafu)?;
    Ok(ApiResponse::ok(playlist, "video added to playlist"))
}

#[instrument(skip(app))]
async fn remove_video(
    State(app): State<App>, CurrentUser(user): CurrentUser,
    ApiPath((id, video)): ApiPath<(Record<Playlist>, Record<Video>)>,
) -> Result<ApiResponse<Playlist>> {
    owned_with_video(&app, &id, &video, &user).await?;

    let contained = Playlist::contains(id.clone(), video.clone(), &app.database)
        .await
        .context(DatabaseSnafu)?
        .unwrap_or_default();
    ensure!(contained, NotFoundSnafu { entity: "playlist video" });

    let playlist = Playlist::remove_video(&id, &video, &app.database)
        .await
        .context(DatabaseSnafu)?;
    Ok(ApiResponse::ok(playlist, "video removed from playlist"))
}
