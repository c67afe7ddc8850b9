use serde::{Deserialize, Serialize};

use crate::database::query::take;
use crate::database::{Database, DatabaseQueryError, Record, Total};

use super::User;

/// Channel totals shown on the owner's dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub total_videos: u64,
    pub total_views: u64,
    pub total_subscribers: u64,
    pub total_subscribed_to: u64,
    /// Likes received on the channel's videos.
    pub total_likes: u64,
    /// Comments received on the channel's videos.
    pub total_comments: u64,
    pub total_tweets: u64,
}

const STATS: &str = "\
    SELECT count() AS total FROM videos WHERE owner = type::thing('users', $channel) GROUP ALL;\
    SELECT math::sum(views) AS total FROM videos WHERE owner = type::thing('users', $channel) GROUP ALL;\
    SELECT count() AS total FROM subscriptions WHERE channel = type::thing('users', $channel) GROUP ALL;\
    SELECT count() AS total FROM subscriptions WHERE subscriber = type::thing('users', $channel) GROUP ALL;\
    SELECT count() AS total FROM likes WHERE kind = 'video' AND target.owner = type::thing('users', $channel) GROUP ALL;\
    SELECT count() AS total FROM comments WHERE video.owner = type::thing('users', $channel) GROUP ALL;\
    SELECT count() AS total FROM tweets WHERE owner = type::thing('users', $channel) GROUP ALL;";

impl ChannelStats {
    #[tracing::instrument(skip(db))]
    pub async fn of(channel: &Record<User>, db: &Database) -> Result<ChannelStats, DatabaseQueryError> {
        let mut response = db.sql(STATS).bind(("channel", channel.key())).execute().await?;
        let mut total = |index| take::<Option<Total>>(&mut response, index).map(Total::of);

        Ok(ChannelStats {
            total_videos: total(0)?,
            total_views: total(1)?,
            total_subscribers: total(2)?,
            total_subscribed_to: total(3)?,
            total_likes: total(4)?,
            total_comments: total(5)?,
            total_tweets: total(6)?,
        })
    }
}
