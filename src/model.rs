use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::Record;

pub mod comment;
pub mod dashboard;
pub mod like;
pub mod playlist;
pub mod subscription;
pub mod tweet;
pub mod user;
pub mod video;

pub use comment::Comment;
pub use dashboard::ChannelStats;
pub use like::{Like, LikeKind, LikeTarget};
pub use playlist::Playlist;
pub use subscription::Subscription;
pub use tweet::Tweet;
pub use user::User;
pub use video::Video;

pub type Timestamp = DateTime<Utc>;

/// The read-model of a user embedded into other documents, rendered by [Lookup](crate::database::Lookup).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub id: Record<User>,
    pub username: String,
    pub full_name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Trims `input` and rejects it when nothing is left.
pub fn non_blank(input: &str) -> Option<&str> {
    Some(input.trim()).filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_blank_trims() {
        assert_eq!(non_blank("  hello \n"), Some("hello"));
        assert_eq!(non_blank(" \t\n"), None);
        assert_eq!(non_blank(""), None);
    }
}
