use serde::{Deserialize, Serialize};

use crate::database::query::take;
use crate::database::{Database, DatabaseQueryError, Field, Filter, Lookup, Pipeline, Record};
use crate::{define_relation, define_table};

use super::{OwnerSummary, Timestamp, User, Video};

/// A playlist without its videos, as listed on a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: Record<Playlist>,
    pub name: String,
    pub description: String,
    pub total_videos: u64,
    pub owner: OwnerSummary,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

define_table!("playlists" : Playlist);

/// A playlist with its videos in playlist order, each with its own owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDetail {
    #[serde(flatten)]
    pub playlist: Playlist,
    pub videos: Vec<Video>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlaylistRecord {
    pub id: Record<Playlist>,
    pub owner: Record<User>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PlaylistChanges {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl PlaylistChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

const FIELDS: &[Field] = &[
    Field::new("meta::id(id)", "id"),
    Field::plain("name"),
    Field::plain("description"),
    Field::new("array::len(videos)", "totalVideos"),
    Field::new("created_at", "createdAt"),
    Field::new("updated_at", "updatedAt"),
];

define_relation! {
    Playlist > record(playlist: Record<Playlist>) > Option<PlaylistRecord>
        where "SELECT meta::id(id) AS id, meta::id(owner) AS owner FROM type::thing('playlists', $playlist)"
}

define_relation! {
    Playlist > contains(playlist: Record<Playlist>, video: Record<Video>) > Option<bool>
        where "SELECT VALUE videos CONTAINS type::thing('videos', $video) FROM type::thing('playlists', $playlist)"
}

impl Playlist {
    pub fn pipeline() -> Pipeline {
        Pipeline::new("playlists", FIELDS).lookup(Lookup::owner())
    }

    pub async fn by_owner(owner: &Record<User>, db: &Database) -> Result<Vec<Playlist>, DatabaseQueryError> {
        Self::pipeline()
            .filter(Filter::links("owner", owner))
            .fetch_all(db)
            .await
    }

    /// The playlist and its videos, read in one round trip.
    #[tracing::instrument(skip(db))]
    pub async fn detail(playlist: &Record<Playlist>, db: &Database) -> Result<Option<PlaylistDetail>, DatabaseQueryError> {
        let query = format!(
            "SELECT {playlist} FROM type::thing('playlists', $playlist);\
             LET $videos = array::flatten((SELECT VALUE videos FROM type::thing('playlists', $playlist)));\
             SELECT {videos} FROM $videos;",
            playlist = Self::pipeline().select_clause(),
            videos = Video::pipeline().select_clause(),
        );

        let mut response = db.sql(query).bind(("playlist", playlist.key())).execute().await?;
        let last = response.num_statements().saturating_sub(1);

        let Some(found) = take::<Option<Playlist>>(&mut response, 0)? else {
            return Ok(None);
        };
        let videos: Vec<Video> = take(&mut response, last)?;

        Ok(Some(PlaylistDetail {
            playlist: found,
            videos,
        }))
    }

    #[tracing::instrument(skip(db))]
    pub async fn create(
        owner: &Record<User>, name: &str, description: &str, db: &Database,
    ) -> Result<Playlist, DatabaseQueryError> {
        let query = format!(
            "CREATE type::thing('playlists', $id) SET name = $name, description = $description, videos = [], \
             owner = type::thing('users', $owner), created_at = time::now(), updated_at = time::now();\
             SELECT {} FROM type::thing('playlists', $id);",
            Self::pipeline().select_clause()
        );

        db.sql(query)
            .bind(("id", Record::<Playlist>::uuid()))
            .bind(("name", name.to_string()))
            .bind(("description", description.to_string()))
            .bind(("owner", owner.key()))
            .fetch_one()
            .await
    }

    #[tracing::instrument(skip(db))]
    pub async fn update(
        playlist: &Record<Playlist>, changes: PlaylistChanges, db: &Database,
    ) -> Result<Playlist, DatabaseQueryError> {
        let query = format!(
            "UPDATE type::thing('playlists', $playlist) SET name = $name ?? name, description = $description ?? description, \
             updated_at = time::now();\
             SELECT {} FROM type::thing('playlists', $playlist);",
            Self::pipeline().select_clause()
        );

        db.sql(query)
            .bind(changes)
            .bind(("playlist", playlist.key()))
            .fetch_one()
            .await
    }

    pub async fn delete(playlist: &Record<Playlist>, db: &Database) -> Result<(), DatabaseQueryError> {
        db.sql("DELETE type::thing('playlists', $playlist)")
            .bind(("playlist", playlist.key()))
            .run()
            .await
    }

    /// Appends `video` unless it is already in the playlist.
    #[tracing::instrument(skip(db))]
    pub async fn add_video(
        playlist: &Record<Playlist>, video: &Record<Video>, db: &Database,
    ) -> Result<Playlist, DatabaseQueryError> {
        let query = format!(
            "UPDATE type::thing('playlists', $playlist) SET videos = array::union(videos, [type::thing('videos', $video)]), \
             updated_at = time::now();\
             SELECT {} FROM type::thing('playlists', $playlist);",
            Self::pipeline().select_clause()
        );

        db.sql(query)
            .bind(("playlist", playlist.key()))
            .bind(("video", video.key()))
            .fetch_one()
            .await
    }

    #[tracing::instrument(skip(db))]
    pub async fn remove_video(
        playlist: &Record<Playlist>, video: &Record<Video>, db: &Database,
    ) -> Result<Playlist, DatabaseQueryError> {
        let query = format!(
            "UPDATE type::thing('playlists', $playlist) SET videos -= type::thing('videos', $video), updated_at = time::now();\
             SELECT {} FROM type::thing('playlists', $playlist);",
            Self::pipeline().select_clause()
        );

        db.sql(query)
            .bind(("playlist", playlist.key()))
            .bind(("video", video.key()))
            .fetch_one()
            .await
    }
}
