use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::database::{
    Database, DatabaseQueryError, Field, Filter, Labels, Lookup, Page, PageRequest, Pipeline, Record, Sort,
};
use crate::service::media::Asset;
use crate::{define_relation, define_table};

use super::{OwnerSummary, Timestamp, User};

/// A video as clients see it, with its owner embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: Record<Video>,
    pub title: String,
    pub description: String,
    pub video_file: Asset,
    pub thumbnail: Asset,
    pub duration: f64,
    pub views: u64,
    pub is_published: bool,
    pub owner: OwnerSummary,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

define_table!("videos" : Video);

/// The columns needed to authorize and clean up after a change.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VideoRecord {
    pub id: Record<Video>,
    pub owner: Record<User>,
    pub video_file: Asset,
    pub thumbnail: Asset,
    pub is_published: bool,
}

pub const FIELDS: &[Field] = &[
    Field::new("meta::id(id)", "id"),
    Field::plain("title"),
    Field::plain("description"),
    Field::new("video_file", "videoFile"),
    Field::plain("thumbnail"),
    Field::plain("duration"),
    Field::plain("views"),
    Field::new("is_published", "isPublished"),
    Field::new("created_at", "createdAt"),
    Field::new("updated_at", "updatedAt"),
];

/// Keys a listing may be sorted by.
pub const SORT_KEYS: &[&str] = &["createdAt", "views", "duration", "title"];

const SEARCH_FIELDS: &[&str] = &["title", "description"];

#[derive(Debug, Clone, Serialize, new)]
pub struct NewVideo {
    #[new(default)]
    pub id: Record<Video>,
    pub title: String,
    pub description: String,
    pub video_file: Asset,
    pub thumbnail: Asset,
    pub duration: f64,
    pub owner: Record<User>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VideoChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<Asset>,
}

impl VideoChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.thumbnail.is_none()
    }
}

/// Filters of the public video listing.
#[derive(Debug, Clone, Default)]
pub struct VideoQuery {
    pub search: Option<String>,
    pub owner: Option<Record<User>>,
    /// The caller, who also sees their own unpublished videos when listing their channel.
    pub viewer: Option<Record<User>>,
    pub sort: Sort,
}

define_relation! {
    Video > record(video: Record<Video>) > Option<VideoRecord>
        where "SELECT meta::id(id) AS id, meta::id(owner) AS owner, video_file, thumbnail, is_published FROM type::thing('videos', $video)"
}

define_relation! {
    Video > set_published(video: Record<Video>, published: bool) > Option<bool>
        where "UPDATE type::thing('videos', $video) SET is_published = $published, updated_at = time::now();\
               SELECT VALUE is_published FROM type::thing('videos', $video);"
}

impl Video {
    pub fn pipeline() -> Pipeline {
        Pipeline::new("videos", FIELDS).lookup(Lookup::owner())
    }

    #[tracing::instrument(skip(db))]
    pub async fn list(query: VideoQuery, request: PageRequest, db: &Database) -> Result<Page<Video>, DatabaseQueryError> {
        let mut pipeline = Self::pipeline().sort(query.sort);

        if let Some(needle) = query.search.as_deref().map(str::trim).filter(|needle| !needle.is_empty()) {
            pipeline = pipeline.filter(Filter::search(SEARCH_FIELDS, needle));
        }

        let own_channel = query.owner.is_some() && query.owner == query.viewer;
        if let Some(owner) = &query.owner {
            pipeline = pipeline.filter(Filter::links("owner", owner));
        }
        if !own_channel {
            pipeline = pipeline.filter(Filter::equals("is_published", true));
        }

        pipeline.paginate(request, Labels::VIDEOS, db).await
    }

    pub async fn find(video: &Record<Video>, db: &Database) -> Result<Option<Video>, DatabaseQueryError> {
        Self::pipeline().fetch_record(video, db).await
    }

    /// Every video of a channel, published or not, newest first.
    pub async fn by_owner(owner: &Record<User>, db: &Database) -> Result<Vec<Video>, DatabaseQueryError> {
        Self::pipeline()
            .filter(Filter::links("owner", owner))
            .fetch_all(db)
            .await
    }

    #[tracing::instrument(skip(db))]
    pub async fn create(video: NewVideo, db: &Database) -> Result<Video, DatabaseQueryError> {
        let query = format!(
            "CREATE type::thing('videos', $id) SET title = $title, description = $description, \
             video_file = $video_file, thumbnail = $thumbnail, duration = $duration, views = 0, is_published = true, \
             owner = type::thing('users', $owner), created_at = time::now(), updated_at = time::now();\
             SELECT {} FROM type::thing('videos', $id);",
            Self::pipeline().select_clause()
        );

        db.sql(query).bind(video).fetch_one().await
    }

    /// Applies the present fields of `changes`, leaving the others untouched.
    #[tracing::instrument(skip(db))]
    pub async fn update(
        video: &Record<Video>, changes: VideoChanges, db: &Database,
    ) -> Result<Video, DatabaseQueryError> {
        let query = format!(
            "UPDATE type::thing('videos', $video) SET title = $title ?? title, description = $description ?? description, \
             thumbnail = $thumbnail ?? thumbnail, updated_at = time::now();\
             SELECT {} FROM type::thing('videos', $video);",
            Self::pipeline().select_clause()
        );

        db.sql(query)
            .bind(changes)
            .bind(("video", video.key()))
            .fetch_one()
            .await
    }

    /// Removes the video together with everything that points at it, in one transaction.
    ///
    /// Stored media is not touched, the caller deletes the assets once this has committed.
    #[tracing::instrument(skip(db))]
    pub async fn delete_cascade(video: &Record<Video>, db: &Database) -> Result<(), DatabaseQueryError> {
        db.sql(
            "LET $video = type::thing('videos', $id);\
             BEGIN TRANSACTION;\
             DELETE likes WHERE target IN (SELECT VALUE id FROM comments WHERE video = $video);\
             DELETE likes WHERE target = $video;\
             DELETE comments WHERE video = $video;\
             UPDATE playlists SET videos -= $video, updated_at = time::now() WHERE videos CONTAINS $video;\
             UPDATE users SET watch_history -= $video WHERE watch_history CONTAINS $video;\
             DELETE $video;\
             COMMIT TRANSACTION;",
        )
        .bind(("id", video.key()))
        .run()
        .await
    }

    /// Counts a view and moves the video to the front of the viewer's history. Returns the new view count.
    #[tracing::instrument(skip(db))]
    pub async fn record_view(
        video: &Record<Video>, viewer: &Record<User>, db: &Database,
    ) -> Result<u64, DatabaseQueryError> {
        db.sql(
            "LET $video = type::thing('videos', $video_id);\
             BEGIN TRANSACTION;\
             UPDATE $video SET views += 1;\
             UPDATE type::thing('users', $viewer) SET watch_history = array::prepend(array::complement(watch_history ?? [], [$video]), $video);\
             COMMIT TRANSACTION;\
             SELECT VALUE views FROM $video;",
        )
        .bind(("video_id", video.key()))
        .bind(("viewer", viewer.key()))
        .fetch_one()
        .await
    }

    /// The viewer's history, most recent first.
    #[tracing::instrument(skip(db))]
    pub async fn watch_history(viewer: &Record<User>, db: &Database) -> Result<Vec<Video>, DatabaseQueryError> {
        let query = format!(
            "LET $history = array::flatten((SELECT VALUE watch_history FROM type::thing('users', $viewer)));\
             SELECT {} FROM $history;",
            Self::pipeline().select_clause()
        );

        db.sql(query).bind(("viewer", viewer.key())).fetch_last().await
    }

    /// Videos the user liked, most recent like first.
    #[tracing::instrument(skip(db))]
    pub async fn liked_by(user: &Record<User>, db: &Database) -> Result<Vec<Video>, DatabaseQueryError> {
        let query = format!(
            "LET $liked = (SELECT target, created_at FROM likes WHERE liked_by = type::thing('users', $user) AND kind = 'video' ORDER BY created_at DESC);\
             SELECT {} FROM $liked.target;",
            Self::pipeline().select_clause()
        );

        db.sql(query).bind(("user", user.key())).fetch_last().await
    }
}
