use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind tag shared by every table that references content by id.
///
/// Tweets and bluesky posts live in one `posts` table disambiguated by this
/// tag; articles keep their own table with numeric ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Article,
    Tweet,
    Bluesky,
}

impl ItemKind {
    pub const POST_KINDS: [ItemKind; 2] = [ItemKind::Tweet, ItemKind::Bluesky];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Article => "article",
            ItemKind::Tweet => "tweet",
            ItemKind::Bluesky => "bluesky",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "article" => Some(ItemKind::Article),
            "tweet" => Some(ItemKind::Tweet),
            "bluesky" => Some(ItemKind::Bluesky),
            _ => None,
        }
    }

    pub fn is_post(&self) -> bool {
        matches!(self, ItemKind::Tweet | ItemKind::Bluesky)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub link: String,
    pub headline: String,
    pub category: String,
    pub short_description: Option<String>,
    pub authors: Option<String>,
    pub published_at: DateTime<Utc>,
    pub cluster_id: Option<i64>,
    pub image_url: Option<String>,
    pub explanation: Option<String>,
    pub region: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Post {
    pub permalink: String,
    pub source: ItemKind,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub retweets: i64,
    pub favorites: i64,
    pub media_url: Option<String>,
    pub explanation: Option<String>,
    pub categories: String,
    pub region: Option<String>,
}

/// One stored piece of content, either kind.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentItem {
    Article(Article),
    Post(Post),
}

impl ContentItem {
    pub fn kind(&self) -> ItemKind {
        match self {
            ContentItem::Article(_) => ItemKind::Article,
            ContentItem::Post(post) => post.source,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            ContentItem::Article(article) => article.published_at,
            ContentItem::Post(post) => post.created_at,
        }
    }
}

/// Common projection emitted by the mixed feeds. Articles and posts are
/// flattened onto the same shape; fields a kind does not have stay `None`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeedItem {
    pub item_type: ItemKind,
    pub item_id: String,
    pub created_at: DateTime<Utc>,
    pub author: Option<String>,
    pub text_content: String,
    pub media_url: Option<String>,
    pub categories: String,
    pub region: Option<String>,
    pub retweets: Option<i64>,
    pub favorites: Option<i64>,
    pub explanation: Option<String>,
    pub score: Option<i64>,
}

impl FeedItem {
    pub fn from_article(article: Article) -> Self {
        FeedItem {
            item_type: ItemKind::Article,
            item_id: article.id.to_string(),
            created_at: article.published_at,
            author: article.authors,
            text_content: article.headline,
            media_url: article.image_url,
            categories: article.category,
            region: article.region,
            retweets: None,
            favorites: None,
            explanation: article.explanation,
            score: None,
        }
    }

    pub fn from_post(post: Post) -> Self {
        FeedItem {
            item_type: post.source,
            item_id: post.permalink,
            created_at: post.created_at,
            author: Some(post.author),
            text_content: post.body,
            media_url: post.media_url,
            categories: post.categories,
            region: post.region,
            retweets: Some(post.retweets),
            favorites: Some(post.favorites),
            explanation: post.explanation,
            score: None,
        }
    }
}

/// A repost with the original content embedded.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RepostEntry {
    pub reposted_by: String,
    pub reposted_at: DateTime<Utc>,
    pub content_type: ItemKind,
    pub original: ContentItem,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SavedItem {
    pub item_type: ItemKind,
    pub item_id: String,
    pub saved_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub item_type: ItemKind,
    pub item_id: String,
    pub username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Splits a comma-separated category list into trimmed, non-empty tokens.
pub fn category_tokens(categories: &str) -> impl Iterator<Item = &str> {
    categories
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Exact tag membership in a comma-separated category set. Tokens are
/// trimmed and compared ASCII case-insensitively.
pub fn has_category_tag(categories: &str, tag: &str) -> bool {
    let tag = tag.trim();
    if tag.is_empty() {
        return false;
    }
    category_tokens(categories).any(|token| token.eq_ignore_ascii_case(tag))
}

/// ASCII case-insensitive substring match.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}
