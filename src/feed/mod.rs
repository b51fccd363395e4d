pub mod filter;
pub mod merge;
pub mod readers;
pub mod score;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::auth::TokenVerifier;
use crate::common::{FeedItem, ItemKind, Post, RepostEntry};
use crate::config::FeedLimits;
use crate::db::Database;
use crate::error::FeedError;
use crate::feed::filter::{FeedQuery, Pagination};
use crate::feed::score::{
    score_post, ScoringContext, POPULARITY_WINDOW_DAYS, TRENDING_POPULARITY_WEIGHT,
};
use crate::TARGET_DB;

/// Why a page of results looks the way it does. Callers surface this as a
/// human-readable status alongside the rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedStatus {
    Found,
    Empty,
    /// The item-type filter resolved to zero sources; nothing was queried.
    NoSources,
}

impl fmt::Display for FeedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            FeedStatus::Found => "content found",
            FeedStatus::Empty => "no content found for the given criteria",
            FeedStatus::NoSources => "no content sources match the requested item type",
        };
        f.write_str(message)
    }
}

/// One page of a feed.
#[derive(Clone, Debug)]
pub struct FeedPage<T> {
    pub status: FeedStatus,
    pub items: Vec<T>,
}

impl<T> FeedPage<T> {
    fn from_items(items: Vec<T>) -> Self {
        let status = if items.is_empty() {
            FeedStatus::Empty
        } else {
            FeedStatus::Found
        };
        FeedPage { status, items }
    }

    fn no_sources() -> Self {
        FeedPage {
            status: FeedStatus::NoSources,
            items: Vec::new(),
        }
    }
}

/// The feed composition engine. Stateless across requests; the only shared
/// state is the connection pool inside `Database`.
pub struct FeedEngine {
    db: Database,
    verifier: Arc<dyn TokenVerifier>,
    limits: FeedLimits,
}

impl FeedEngine {
    pub fn new(db: Database, verifier: Arc<dyn TokenVerifier>, limits: FeedLimits) -> Self {
        FeedEngine {
            db,
            verifier,
            limits,
        }
    }

    async fn resolve_token(&self, token: &str) -> Result<String, FeedError> {
        self.verifier
            .verify(token)
            .await?
            .ok_or(FeedError::InvalidToken)
    }

    /// Mixed article/post feed, newest first.
    pub async fn chronological(
        &self,
        query: &FeedQuery,
        pagination: Pagination,
    ) -> Result<FeedPage<FeedItem>, FeedError> {
        let Some(item_filter) = query.item_filter else {
            debug!(target: TARGET_DB, "Chronological feed requested with unknown item type filter");
            return Ok(FeedPage::no_sources());
        };

        let mut sets = Vec::new();
        sets.push(readers::read_posts(&self.db, query, item_filter.post_sources()).await?);
        if item_filter.includes_articles() {
            sets.push(readers::read_articles(&self.db, query).await?);
        }

        Ok(FeedPage::from_items(merge::merge(sets, pagination)))
    }

    /// Personalized feed: every post re-scored against the requester's
    /// follow graph, preferences, interaction history and region.
    pub async fn personalized(
        &self,
        token: &str,
        pagination: Pagination,
    ) -> Result<FeedPage<FeedItem>, FeedError> {
        let username = self.resolve_token(token).await?;
        let ctx = ScoringContext::load(&self.db, &username, Utc::now()).await?;

        let posts = self.db.fetch_posts(&ItemKind::POST_KINDS, None).await?;
        let mut items: Vec<FeedItem> = posts
            .into_iter()
            .map(|post| {
                let score = score_post(&post, &ctx);
                let mut item = FeedItem::from_post(post);
                item.score = Some(score);
                item
            })
            .collect();

        merge::order_items(&mut items);
        Ok(FeedPage::from_items(merge::paginate(items, pagination)))
    }

    /// Trending tweets: favorites plus weighted 7-day popularity, over the
    /// window starting one day before the most recent tweet.
    pub async fn trending(
        &self,
        region: Option<&str>,
        pagination: Pagination,
    ) -> Result<FeedPage<FeedItem>, FeedError> {
        let region = region.map(str::trim).filter(|region| !region.is_empty());

        let Some(latest) = self.db.latest_tweet_created_at(region).await? else {
            return Ok(FeedPage::from_items(Vec::new()));
        };
        let cutoff = trending_cutoff(latest);

        let posts = self.db.fetch_tweets_since(cutoff, region).await?;
        let popularity = self
            .db
            .recent_popularity(Utc::now() - Duration::days(POPULARITY_WINDOW_DAYS))
            .await?;

        let mut ranked: Vec<(i64, Post)> = posts
            .into_iter()
            .map(|post| {
                let recent = popularity
                    .get(&(post.source, post.permalink.clone()))
                    .copied()
                    .unwrap_or(0);
                (post.favorites + recent * TRENDING_POPULARITY_WEIGHT, post)
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| b.1.created_at.cmp(&a.1.created_at))
        });

        let items = merge::paginate(ranked, pagination)
            .into_iter()
            .map(|(_, post)| FeedItem::from_post(post))
            .collect();
        Ok(FeedPage::from_items(items))
    }

    /// Reposts by everyone the requester follows, originals embedded,
    /// newest repost first.
    pub async fn friends_reposts(
        &self,
        token: &str,
        pagination: Pagination,
    ) -> Result<FeedPage<RepostEntry>, FeedError> {
        pagination.ensure_limit_within(self.limits.friends_reposts_max_limit)?;
        let username = self.resolve_token(token).await?;

        let followed = self.db.followed_usernames(&username).await?;
        let mut entries = readers::read_reposts(&self.db, &followed).await?;
        entries.sort_by(|a, b| b.reposted_at.cmp(&a.reposted_at));

        Ok(FeedPage::from_items(merge::paginate(entries, pagination)))
    }

    /// Reposts made by one user, originals embedded.
    pub async fn reposts_by_user(
        &self,
        username: &str,
        pagination: Pagination,
    ) -> Result<FeedPage<RepostEntry>, FeedError> {
        pagination.ensure_limit_within(self.limits.reposts_by_user_max_limit)?;

        let usernames = [username.to_string()];
        let mut entries = readers::read_reposts(&self.db, &usernames).await?;
        entries.sort_by(|a, b| b.reposted_at.cmp(&a.reposted_at));

        Ok(FeedPage::from_items(merge::paginate(entries, pagination)))
    }

    /// Free-text search across both content kinds, newest first.
    pub async fn search(
        &self,
        needle: &str,
        pagination: Pagination,
    ) -> Result<FeedPage<FeedItem>, FeedError> {
        let needle = needle.trim();
        if needle.is_empty() {
            return Err(FeedError::Validation(
                "search query must not be empty".to_string(),
            ));
        }

        let articles: Vec<FeedItem> = self
            .db
            .search_articles(needle)
            .await?
            .into_iter()
            .map(FeedItem::from_article)
            .collect();
        let posts: Vec<FeedItem> = self
            .db
            .search_posts(needle)
            .await?
            .into_iter()
            .map(FeedItem::from_post)
            .collect();

        Ok(FeedPage::from_items(merge::merge(
            vec![articles, posts],
            pagination,
        )))
    }
}

/// Midnight UTC one day before the most recent tweet's date.
fn trending_cutoff(latest: DateTime<Utc>) -> DateTime<Utc> {
    let cutoff_date = latest.date_naive() - Duration::days(1);
    DateTime::from_naive_utc_and_offset(cutoff_date.and_time(NaiveTime::MIN), Utc)
}
