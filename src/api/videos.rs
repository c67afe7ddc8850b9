use axum::body::Bytes;
use axum::extract::multipart::{Field, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::routing::{get, patch, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, NoneAsEmptyString};
use snafu::{ensure, OptionExt, ResultExt};
use tracing::instrument;

use crate::auth::CurrentUser;
use crate::database::{Page, PageRequest, Record, Sort, SortOrder};
use crate::model::video::{NewVideo, VideoChanges, VideoQuery, VideoRecord, SORT_KEYS};
use crate::model::{non_blank, User, Video};
use crate::service::media::{discard, MediaKind};

use super::{
    ApiPath, ApiQuery, ApiResponse, App, DatabaseSnafu, Deleted, ForbiddenSnafu, MediaSnafu, NotFoundSnafu,
    PaginationSnafu, Result, ValidationSnafu,
};

pub fn routes() -> Router<App> {
    Router::new()
        .route("/videos", get(list).post(publish))
        .route("/videos/:id", get(find).patch(update).delete(remove))
        .route("/videos/:id/publish", patch(toggle_publish))
        .route("/videos/:id/views", post(record_view))
        .route("/history", get(history))
}

#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListVideos {
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub page: Option<u64>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_type: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub user_id: Option<Record<User>>,
}

#[instrument(skip(app))]
async fn list(
    State(app): State<App>, viewer: Option<CurrentUser>, ApiQuery(query): ApiQuery<ListVideos>,
) -> Result<ApiResponse<Page<Video>>> {
    let request = PageRequest::new(query.page, query.limit).context(PaginationSnafu)?;
    let order = SortOrder::parse(query.sort_type.as_deref());
    let filters = VideoQuery {
        search: query.query,
        owner: query.user_id,
        viewer: viewer.map(|CurrentUser(user)| user),
        sort: Sort::resolve(query.sort_by.as_deref(), order, SORT_KEYS),
    };

    let page = Video::list(filters, request, &app.database).await.context(DatabaseSnafu)?;

    let message = if page.is_empty() { "No videos found" } else { "videos fetched" };
    Ok(ApiResponse::ok(page, message))
}

/// A file part of a multipart form.
#[derive(Debug, Clone)]
struct Upload {
    file_name: String,
    bytes: Bytes,
}

impl Upload {
    async fn read(field: Field<'_>) -> Result<Option<Upload>> {
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let bytes = field.bytes().await?;

        Ok((!bytes.is_empty()).then_some(Upload { file_name, bytes }))
    }
}

#[derive(Debug, Default)]
struct VideoForm {
    title: Option<String>,
    description: Option<String>,
    duration: Option<String>,
    video_file: Option<Upload>,
    thumbnail: Option<Upload>,
}

impl VideoForm {
    async fn read(mut multipart: Multipart) -> Result<VideoForm> {
        let mut form = VideoForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "title" => form.title = Some(field.text().await?),
                "description" => form.description = Some(field.text().await?),
                "duration" => form.duration = Some(field.text().await?),
                "videoFile" => form.video_file = Upload::read(field).await?,
                "thumbnail" => form.thumbnail = Upload::read(field).await?,
                _ => tracing::debug!(%name, "ignoring unknown form field"),
            }
        }

        Ok(form)
    }

    fn duration(&self) -> Result<f64> {
        let Some(duration) = self.duration.as_deref().and_then(non_blank) else {
            return Ok(0.0);
        };

        duration
            .parse::<f64>()
            .ok()
            .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
            .context(ValidationSnafu {
                message: "duration must be a non-negative number of seconds",
            })
    }
}

/// Optional text field of an update: absent stays absent, present must not be blank.
fn changed(value: Option<String>, field: &str) -> Result<Option<String>> {
    match value {
        None => Ok(None),
        Some(value) => non_blank(&value)
            .map(|value| Some(value.to_string()))
            .context(ValidationSnafu {
                message: format!("{field} cannot be blank"),
            }),
    }
}

#[instrument(skip(app, multipart))]
async fn publish(
    State(app): State<App>, CurrentUser(owner): CurrentUser, multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<Video>> {
    let form = VideoForm::read(multipart?).await?;

    let (Some(title), Some(description)) = (
        form.title.as_deref().and_then(non_blank),
        form.description.as_deref().and_then(non_blank),
    ) else {
        return ValidationSnafu { message: "title and description are required" }.fail();
    };
    let duration = form.duration()?;
    let (Some(video_file), Some(thumbnail)) = (form.video_file.clone(), form.thumbnail.clone()) else {
        return ValidationSnafu { message: "videoFile and thumbnail are required" }.fail();
    };

    let media = app.media();
    let uploads = futures::join!(
        media.upload(MediaKind::Video, &video_file.file_name, video_file.bytes),
        media.upload(MediaKind::Thumbnail, &thumbnail.file_name, thumbnail.bytes),
    );
    let (video_file, thumbnail) = match uploads {
        (Ok(video_file), Ok(thumbnail)) => (video_file, thumbnail),
        (Ok(uploaded), Err(err)) | (Err(err), Ok(uploaded)) => {
            discard(media, [&uploaded]).await;
            return Err(err).context(MediaSnafu);
        }
        (Err(err), Err(_)) => return Err(err).context(MediaSnafu),
    };

    let video = NewVideo::new(
        title.to_string(),
        description.to_string(),
        video_file.clone(),
        thumbnail.clone(),
        duration,
        owner,
    );

    match Video::create(video, &app.database).await {
        Ok(video) => {
            tracing::info!(video = %video.id, "published video");
            Ok(ApiResponse::created(video, "video published"))
        }
        Err(err) => {
            discard(media, [&video_file, &thumbnail]).await;
            Err(err).context(DatabaseSnafu)
        }
    }
}

#[instrument(skip(app))]
async fn find(State(app): State<App>, ApiPath(id): ApiPath<Record<Video>>) -> Result<ApiResponse<Video>> {
    let video = Video::find(&id, &app.database)
        .await
        .context(DatabaseSnafu)?
        .context(NotFoundSnafu { entity: "video" })?;

    Ok(ApiResponse::ok(video, "video fetched"))
}

/// Loads the video and checks that `user` owns it.
async fn owned(app: &App, id: &Record<Video>, user: &Record<User>) -> Result<VideoRecord> {
    let video = Video::record(id.clone(), &app.database)
        .await
        .context(DatabaseSnafu)?
        .context(NotFoundSnafu { entity: "video" })?;

    ensure!(&video.owner == user, ForbiddenSnafu { entity: "video" });
    Ok(video)
}

#[instrument(skip(app, multipart))]
async fn update(
    State(app): State<App>, CurrentUser(user): CurrentUser, ApiPath(id): ApiPath<Record<Video>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<Video>> {
    let current = owned(&app, &id, &user).await?;

    let form = VideoForm::read(multipart?).await?;
    let title = changed(form.title, "title")?;
    let description = changed(form.description, "description")?;
    ensure!(
        title.is_some() || description.is_some() || form.thumbnail.is_some(),
        ValidationSnafu { message: "provide a title, description or thumbnail to update" }
    );

    let media = app.media();
    let thumbnail = match form.thumbnail {
        Some(upload) => Some(
            media
                .upload(MediaKind::Thumbnail, &upload.file_name, upload.bytes)
                .await
                .context(MediaSnafu)?,
        ),
        None => None,
    };

    let changes = VideoChanges {
        title,
        description,
        thumbnail: thumbnail.clone(),
    };

    match Video::update(&id, changes, &app.database).await {
        Ok(video) => {
            if thumbnail.is_some() {
                discard(media, [&current.thumbnail]).await;
            }
            Ok(ApiResponse::ok(video, "video updated"))
        }
        Err(err) => {
            discard(media, thumbnail.iter()).await;
            Err(err).context(DatabaseSnafu)
        }
    }
}

#[instrument(skip(app))]
async fn remove(
    State(app): State<App>, CurrentUser(user): CurrentUser, ApiPath(id): ApiPath<Record<Video>>,
) -> Result<ApiResponse<Deleted<Video>>> {
    let video = owned(&app, &id, &user).await?;

    Video::delete_cascade(&id, &app.database).await.context(DatabaseSnafu)?;
    discard(app.media(), [&video.video_file, &video.thumbnail]).await;

    tracing::info!(video = %id, "deleted video");
    Ok(ApiResponse::ok(Deleted { id }, "video deleted"))
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishStatus {
    pub is_published: bool,
}

#[instrument(skip(app))]
async fn toggle_publish(
    State(app): State<App>, CurrentUser(user): CurrentUser, ApiPath(id): ApiPath<Record<Video>>,
) -> Result<ApiResponse<PublishStatus>> {
    let video = owned(&app, &id, &user).await?;

    let is_published = Video::set_published(id, !video.is_published, &app.database)
        .await
        .context(DatabaseSnafu)?
        .context(NotFoundSnafu { entity: "video" })?;

    Ok(ApiResponse::ok(PublishStatus { is_published }, "publish status toggled"))
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ViewCount {
    pub views: u64,
}

#[instrument(skip(app))]
async fn record_view(
    State(app): State<App>, CurrentUser(user): CurrentUser, ApiPath(id): ApiPath<Record<Video>>,
) -> Result<ApiResponse<ViewCount>> {
    Video::record(id.clone(), &app.database)
        .await
        .context(DatabaseSnafu)?
        .context(NotFoundSnafu { entity: "video" })?;

    let views = Video::record_view(&id, &user, &app.database).await.context(DatabaseSnafu)?;
    Ok(ApiResponse::ok(ViewCount { views }, "view recorded"))
}

#[instrument(skip(app))]
async fn history(State(app): State<App>, CurrentUser(user): CurrentUser) -> Result<ApiResponse<Vec<Video>>> {
    let videos = Video::watch_history(&user, &app.database).await.context(DatabaseSnafu)?;
    Ok(ApiResponse::ok(videos, "watch history fetched"))
}

