use serde::{Deserialize, Serialize};

use crate::database::{
    Database, DatabaseQueryError, Field, Filter, Labels, Lookup, Page, PageRequest, Pipeline, Record,
};
use crate::{define_relation, define_table};

use super::{OwnerSummary, Timestamp, User, Video};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Record<Comment>,
    pub content: String,
    pub video: Record<Video>,
    pub owner: OwnerSummary,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

define_table!("comments" : Comment);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommentRecord {
    pub id: Record<Comment>,
    pub owner: Record<User>,
}

const FIELDS: &[Field] = &[
    Field::new("meta::id(id)", "id"),
    Field::plain("content"),
    Field::new("meta::id(video)", "video"),
    Field::new("created_at", "createdAt"),
    Field::new("updated_at", "updatedAt"),
];

define_relation! {
    Comment > record(comment: Record<Comment>) > Option<CommentRecord>
        where "SELECT meta::id(id) AS id, meta::id(owner) AS owner FROM type::thing('comments', $comment)"
}

impl Comment {
    pub fn pipeline() -> Pipeline {
        Pipeline::new("comments", FIELDS).lookup(Lookup::owner())
    }

    /// Comments of a video, newest first.
    #[tracing::instrument(skip(db))]
    pub async fn list_for(
        video: &Record<Video>, request: PageRequest, db: &Database,
    ) -> Result<Page<Comment>, DatabaseQueryError> {
        Self::pipeline()
            .filter(Filter::links("video", video))
            .paginate(request, Labels::COMMENTS, db)
            .await
    }

    /// `content` must already be trimmed and non-empty.
    #[tracing::instrument(skip(db))]
    pub async fn create(
        video: &Record<Video>, owner: &Record<User>, content: &str, db: &Database,
    ) -> Result<Comment, DatabaseQueryError> {
        let query = format!(
            "CREATE type::thing('comments', $id) SET content = $content, video = type::thing('videos', $video), \
             owner = type::thing('users', $owner), created_at = time::now(), updated_at = time::now();\
             SELECT {} FROM type::thing('comments', $id);",
            Self::pipeline().select_clause()
        );

        db.sql(query)
            .bind(("id", Record::<Comment>::uuid()))
            .bind(("content", content.to_string()))
            .bind(("video", video.key()))
            .bind(("owner", owner.key()))
            .fetch_one()
            .await
    }

    #[tracing::instrument(skip(db))]
    pub async fn update(comment: &Record<Comment>, content: &str, db: &Database) -> Result<Comment, DatabaseQueryError> {
        let query = format!(
            "UPDATE type::thing('comments', $comment) SET content = $content, updated_at = time::now();\
             SELECT {} FROM type::thing('comments', $comment);",
            Self::pipeline().select_clause()
        );

        db.sql(query)
            .bind(("comment", comment.key()))
            .bind(("content", content.to_string()))
            .fetch_one()
            .await
    }

    /// Deletes the comment and the likes on it.
    #[tracing::instrument(skip(db))]
    pub async fn delete(comment: &Record<Comment>, db: &Database) -> Result<(), DatabaseQueryError> {
        db.sql(
            "LET $comment = type::thing('comments', $id);\
             BEGIN TRANSACTION;\
             DELETE likes WHERE target = $comment;\
             DELETE $comment;\
             COMMIT TRANSACTION;",
        )
        .bind(("id", comment.key()))
        .run()
        .await
    }
}
