use std::fmt;

use serde::{Deserialize, Serialize};

use crate::database::{Database, DatabaseQueryError, Record, Table};
use crate::define_table;

use super::{Comment, Tweet, User, Video};

/// A user's like on one video, comment or tweet. Stored as `likes:⟨kind_target_user⟩` so a second like on the
/// same target cannot exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Like;

define_table!("likes" : Like);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeKind {
    Video,
    Comment,
    Tweet,
}

impl LikeKind {
    pub fn table(&self) -> &'static str {
        match self {
            LikeKind::Video => Video::table(),
            LikeKind::Comment => Comment::table(),
            LikeKind::Tweet => Tweet::table(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LikeKind::Video => "video",
            LikeKind::Comment => "comment",
            LikeKind::Tweet => "tweet",
        }
    }
}

impl fmt::Display for LikeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a like points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LikeTarget {
    pub kind: LikeKind,
    pub id: String,
}

impl LikeTarget {
    pub fn video(video: &Record<Video>) -> Self {
        Self {
            kind: LikeKind::Video,
            id: video.key(),
        }
    }

    pub fn comment(comment: &Record<Comment>) -> Self {
        Self {
            kind: LikeKind::Comment,
            id: comment.key(),
        }
    }

    pub fn tweet(tweet: &Record<Tweet>) -> Self {
        Self {
            kind: LikeKind::Tweet,
            id: tweet.key(),
        }
    }

    /// Record key of the like `user` would put on this target.
    pub fn like_key(&self, user: &Record<User>) -> String {
        format!("{}_{}_{}", self.kind, self.id, user.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggle {
    pub liked: bool,
    pub total_likes: u64,
}

impl Like {
    pub async fn target_exists(target: &LikeTarget, db: &Database) -> Result<bool, DatabaseQueryError> {
        let found: Option<String> = db
            .sql("SELECT VALUE meta::id(id) FROM type::thing($table, $target)")
            .bind(("table", target.kind.table()))
            .bind(("target", target.id.clone()))
            .fetch_first()
            .await?;

        Ok(found.is_some())
    }

    /// Removes the user's like on `target` if there is one, otherwise adds it. Both branches run in one transaction.
    #[tracing::instrument(skip(db))]
    pub async fn toggle(target: &LikeTarget, user: &Record<User>, db: &Database) -> Result<LikeToggle, DatabaseQueryError> {
        let toggle: LikeToggle = db
            .sql(
                "LET $target = type::thing($table, $target_id);\
                 LET $like = type::thing('likes', $like_id);\
                 BEGIN TRANSACTION;\
                 LET $removed = array::compact((DELETE $like RETURN BEFORE));\
                 IF array::len($removed) = 0 THEN \
                     (CREATE $like SET kind = $kind, target = $target, liked_by = type::thing('users', $user), created_at = time::now()) \
                 END;\
                 COMMIT TRANSACTION;\
                 RETURN { liked: array::len($removed) = 0, totalLikes: array::len((SELECT VALUE id FROM likes WHERE target = $target)) };",
            )
            .bind(("table", target.kind.table()))
            .bind(("target_id", target.id.clone()))
            .bind(("like_id", target.like_key(user)))
            .bind(("kind", target.kind))
            .bind(("user", user.key()))
            .fetch_one()
            .await?;

        tracing::debug!(liked = toggle.liked, total = toggle.total_likes, "toggled like");
        Ok(toggle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_their_tables() {
        assert_eq!(LikeKind::Video.table(), "videos");
        assert_eq!(LikeKind::Comment.table(), "comments");
        assert_eq!(LikeKind::Tweet.table(), "tweets");
    }

    #[test]
    fn like_key_is_stable_per_target_and_user() {
        let video = Record::<Video>::uuid();
        let user = Record::<User>::uuid();
        let target = LikeTarget::video(&video);

        assert_eq!(target.like_key(&user), format!("video_{video}_{user}"));
        assert_eq!(target.like_key(&user), LikeTarget::video(&video).like_key(&user));
        assert_ne!(target.like_key(&user), LikeTarget::video(&video).like_key(&Record::uuid()));
    }

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(serde_json::to_value(LikeKind::Comment).unwrap(), serde_json::json!("comment"));
    }
}
