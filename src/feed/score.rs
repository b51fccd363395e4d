use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use tracing::warn;

use crate::common::{category_tokens, has_category_tag, ItemKind, Post};
use crate::db::Database;
use crate::TARGET_DB;

/// Boost for a post reposted by someone the requester follows, any time.
pub const FOLLOWED_REPOST_BOOST: i64 = 150;
/// Boost when any declared preference tag appears in the item's tag set.
pub const PREFERENCE_MATCH_BOOST: i64 = 50;
/// Multiplier on the item's own 7-day interaction count.
pub const RECENT_POPULARITY_WEIGHT: i64 = 3;
/// Boost when the item's region equals the requester's stored region.
pub const REGION_MATCH_BOOST: i64 = 75;
/// Multiplier on 7-day popularity in the trending feed.
pub const TRENDING_POPULARITY_WEIGHT: i64 = 5;

pub const POPULARITY_WINDOW_DAYS: i64 = 7;
pub const AFFINITY_WINDOW_DAYS: i64 = 30;

/// Everything the scorer needs about one requester, loaded fresh per
/// request. Scores are derived values; nothing here is cached or persisted.
pub struct ScoringContext {
    pub followed_repost_ids: HashSet<String>,
    pub preferences: Vec<String>,
    /// Lowercased category token -> 30-day interaction count.
    pub category_affinity: HashMap<String, i64>,
    /// 7-day interaction counts per item, all users.
    pub recent_popularity: HashMap<(ItemKind, String), i64>,
    pub region: Option<String>,
}

impl ScoringContext {
    pub(crate) async fn load(
        db: &Database,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        let followed = db.followed_usernames(username).await?;
        let followed_repost_ids = db.reposted_post_ids_by_users(&followed).await?;
        let preferences = db.preferences(username).await?;
        let category_affinity = db
            .category_affinity(username, now - Duration::days(AFFINITY_WINDOW_DAYS))
            .await?;
        let recent_popularity = db
            .recent_popularity(now - Duration::days(POPULARITY_WINDOW_DAYS))
            .await?;

        // The one lookup that degrades instead of failing the request: a
        // post without the region boost is still a valid result.
        let region = match db.user_region(username).await {
            Ok(region) => region,
            Err(err) => {
                warn!(target: TARGET_DB, "Region lookup failed for {}: {}; scoring without region boost", username, err);
                None
            }
        };

        Ok(ScoringContext {
            followed_repost_ids,
            preferences,
            category_affinity,
            recent_popularity,
            region,
        })
    }
}

pub fn followed_repost_signal(post: &Post, ctx: &ScoringContext) -> i64 {
    if ctx.followed_repost_ids.contains(&post.permalink) {
        FOLLOWED_REPOST_BOOST
    } else {
        0
    }
}

pub fn preference_signal(post: &Post, ctx: &ScoringContext) -> i64 {
    let matched = ctx
        .preferences
        .iter()
        .any(|preference| has_category_tag(&post.categories, preference));
    if matched {
        PREFERENCE_MATCH_BOOST
    } else {
        0
    }
}

/// Sum of the requester's windowed interaction counts for every category
/// token the post carries.
pub fn affinity_signal(post: &Post, ctx: &ScoringContext) -> i64 {
    category_tokens(&post.categories)
        .map(|token| {
            ctx.category_affinity
                .get(&token.to_ascii_lowercase())
                .copied()
                .unwrap_or(0)
        })
        .sum()
}

pub fn popularity_signal(post: &Post, ctx: &ScoringContext) -> i64 {
    let count = ctx
        .recent_popularity
        .get(&(post.source, post.permalink.clone()))
        .copied()
        .unwrap_or(0);
    count * RECENT_POPULARITY_WEIGHT
}

/// Case-sensitive equality; region values are stored canonically.
pub fn region_signal(post: &Post, ctx: &ScoringContext) -> i64 {
    match (&post.region, &ctx.region) {
        (Some(post_region), Some(user_region)) if post_region == user_region => {
            REGION_MATCH_BOOST
        }
        _ => 0,
    }
}

pub fn score_post(post: &Post, ctx: &ScoringContext) -> i64 {
    followed_repost_signal(post, ctx)
        + preference_signal(post, ctx)
        + affinity_signal(post, ctx)
        + popularity_signal(post, ctx)
        + region_signal(post, ctx)
}
