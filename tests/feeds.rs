use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use chronicle::auth::DbTokenVerifier;
use chronicle::common::{ContentItem, ItemKind};
use chronicle::config::FeedLimits;
use chronicle::db::Database;
use chronicle::feed::filter::{FeedQuery, Pagination};
use chronicle::feed::{FeedEngine, FeedStatus};
use chronicle::FeedError;

fn minutes_ago(minutes: i64) -> DateTime<Utc> {
    Utc::now() - Duration::minutes(minutes)
}

async fn engine() -> (FeedEngine, Database) {
    let db = Database::in_memory().await.unwrap();
    let verifier = Arc::new(DbTokenVerifier::new(db.clone()));
    (
        FeedEngine::new(db.clone(), verifier, FeedLimits::default()),
        db,
    )
}

async fn add_article(
    db: &Database,
    headline: &str,
    category: &str,
    region: Option<&str>,
    minutes: i64,
) -> i64 {
    db.add_article(
        &format!("https://example.com/{}", headline),
        headline,
        category,
        None,
        Some("Jane Doe"),
        minutes_ago(minutes),
        None,
        None,
        region,
    )
    .await
    .unwrap()
}

#[allow(clippy::too_many_arguments)]
async fn add_post(
    db: &Database,
    permalink: &str,
    source: ItemKind,
    categories: &str,
    region: Option<&str>,
    favorites: i64,
    minutes: i64,
) {
    db.add_post(
        permalink,
        source,
        "poster",
        &format!("body of {}", permalink),
        minutes_ago(minutes),
        0,
        favorites,
        None,
        categories,
        region,
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn chronological_merges_sources_newest_first() {
    let (engine, db) = engine().await;
    add_article(&db, "older-article", "Tech", None, 30).await;
    add_post(&db, "newest-post", ItemKind::Tweet, "", None, 0, 10).await;
    add_post(&db, "middle-post", ItemKind::Bluesky, "", None, 0, 20).await;

    let page = engine
        .chronological(&FeedQuery::default(), Pagination::default())
        .await
        .unwrap();

    assert_eq!(page.status, FeedStatus::Found);
    let ids: Vec<&str> = page.items.iter().map(|i| i.item_id.as_str()).collect();
    assert_eq!(ids[0], "newest-post");
    assert_eq!(ids[1], "middle-post");
    assert_eq!(page.items[2].item_type, ItemKind::Article);
}

#[tokio::test]
async fn chronological_item_type_filter_selects_sources() {
    let (engine, db) = engine().await;
    add_article(&db, "an-article", "Tech", None, 5).await;
    add_post(&db, "a-tweet", ItemKind::Tweet, "", None, 0, 5).await;
    add_post(&db, "a-skeet", ItemKind::Bluesky, "", None, 0, 5).await;

    let articles_only = FeedQuery::build(&[], None, Some("article"));
    let page = engine
        .chronological(&articles_only, Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].item_type, ItemKind::Article);

    let tweets_only = FeedQuery::build(&[], None, Some("tweet"));
    let page = engine
        .chronological(&tweets_only, Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].item_id, "a-tweet");
}

#[tokio::test]
async fn unknown_item_type_resolves_to_zero_sources_not_an_error() {
    let (engine, db) = engine().await;
    add_post(&db, "a-tweet", ItemKind::Tweet, "", None, 0, 5).await;

    let query = FeedQuery::build(&[], None, Some("podcast"));
    let page = engine
        .chronological(&query, Pagination::default())
        .await
        .unwrap();

    assert_eq!(page.status, FeedStatus::NoSources);
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn category_matching_is_substring_for_articles_and_tag_for_posts() {
    let (engine, db) = engine().await;
    add_article(&db, "tech-article", "SCIENCE & TECHNOLOGY", None, 5).await;
    add_post(&db, "tagged-post", ItemKind::Tweet, "Tech, Business", None, 0, 5).await;
    add_post(&db, "near-miss-post", ItemKind::Tweet, "Technology", None, 0, 5).await;

    let query = FeedQuery::build(&["tech".to_string()], None, None);
    let page = engine
        .chronological(&query, Pagination::default())
        .await
        .unwrap();

    let ids: Vec<&str> = page.items.iter().map(|i| i.item_id.as_str()).collect();
    assert!(ids.contains(&"tagged-post"));
    assert!(!ids.contains(&"near-miss-post"));
    assert_eq!(
        page.items
            .iter()
            .filter(|i| i.item_type == ItemKind::Article)
            .count(),
        1
    );
}

#[tokio::test]
async fn chronological_region_filter_narrows_both_sources() {
    let (engine, db) = engine().await;
    add_article(&db, "us-article", "News", Some("US"), 5).await;
    add_article(&db, "uk-article", "News", Some("UK"), 5).await;
    add_post(&db, "us-post", ItemKind::Tweet, "", Some("US"), 0, 5).await;
    add_post(&db, "global-post", ItemKind::Tweet, "", None, 0, 5).await;

    let query = FeedQuery::build(&[], Some("US"), None);
    let page = engine
        .chronological(&query, Pagination::default())
        .await
        .unwrap();

    assert_eq!(page.items.len(), 2);
    assert!(page.items.iter().all(|i| i.region.as_deref() == Some("US")));
}

#[tokio::test]
async fn pagination_offsets_into_the_combined_ordering() {
    let (engine, db) = engine().await;
    for n in 0..7 {
        add_post(
            &db,
            &format!("post-{}", n),
            ItemKind::Tweet,
            "",
            None,
            0,
            n,
        )
        .await;
    }

    let page2 = engine
        .chronological(&FeedQuery::default(), Pagination::new(2, 3).unwrap())
        .await
        .unwrap();
    let ids: Vec<&str> = page2.items.iter().map(|i| i.item_id.as_str()).collect();
    assert_eq!(ids, vec!["post-3", "post-4", "post-5"]);

    let page4 = engine
        .chronological(&FeedQuery::default(), Pagination::new(4, 3).unwrap())
        .await
        .unwrap();
    assert_eq!(page4.status, FeedStatus::Empty);
}

#[tokio::test]
async fn personalized_boosts_posts_reposted_by_followed_users() {
    let (engine, db) = engine().await;
    db.add_user("alice", None, Some("tok-alice"), None)
        .await
        .unwrap();
    db.add_user("bob", None, None, None).await.unwrap();
    db.request_follow("alice", "bob").await.unwrap();
    db.accept_follow_request("alice", "bob").await.unwrap();

    add_post(&db, "boosted", ItemKind::Tweet, "", None, 0, 180).await;
    add_post(&db, "fresh", ItemKind::Tweet, "", None, 0, 10).await;
    db.add_repost("bob", ItemKind::Tweet, "boosted", minutes_ago(60))
        .await
        .unwrap();

    let page = engine
        .personalized("tok-alice", Pagination::default())
        .await
        .unwrap();

    assert_eq!(page.items[0].item_id, "boosted");
    assert_eq!(page.items[0].score, Some(150));
    assert_eq!(page.items[1].item_id, "fresh");
    assert_eq!(page.items[1].score, Some(0));
}

#[tokio::test]
async fn personalized_ignores_pending_follow_edges() {
    let (engine, db) = engine().await;
    db.add_user("alice", None, Some("tok-alice"), None)
        .await
        .unwrap();
    db.add_user("bob", None, None, None).await.unwrap();
    db.request_follow("alice", "bob").await.unwrap();

    add_post(&db, "reposted", ItemKind::Tweet, "", None, 0, 60).await;
    db.add_repost("bob", ItemKind::Tweet, "reposted", minutes_ago(30))
        .await
        .unwrap();

    let page = engine
        .personalized("tok-alice", Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.items[0].score, Some(0));
}

#[tokio::test]
async fn personalized_adds_preference_and_region_boosts() {
    let (engine, db) = engine().await;
    db.add_user("alice", None, Some("tok-alice"), Some("US"))
        .await
        .unwrap();
    db.add_preference("alice", "tech").await.unwrap();

    add_post(&db, "matching", ItemKind::Tweet, "Tech, AI", Some("US"), 0, 60).await;
    add_post(&db, "plain", ItemKind::Tweet, "Sports", Some("UK"), 0, 10).await;

    let page = engine
        .personalized("tok-alice", Pagination::default())
        .await
        .unwrap();

    // preference 50 + region 75
    assert_eq!(page.items[0].item_id, "matching");
    assert_eq!(page.items[0].score, Some(125));
    assert_eq!(page.items[1].score, Some(0));
}

#[tokio::test]
async fn personalized_counts_windowed_interactions() {
    let (engine, db) = engine().await;
    db.add_user("alice", None, Some("tok-alice"), None)
        .await
        .unwrap();

    add_post(&db, "interacted", ItemKind::Tweet, "Tech", None, 0, 120).await;
    add_post(&db, "sibling", ItemKind::Tweet, "Tech", None, 0, 60).await;

    // Two distinct interactions by the requester inside both windows.
    for n in 0..2 {
        db.record_interaction(
            "alice",
            ItemKind::Tweet,
            "interacted",
            "click",
            None,
            minutes_ago(30 + n),
        )
        .await
        .unwrap();
    }
    // An interaction far outside the 7-day popularity window still counts
    // toward 30-day affinity.
    db.record_interaction(
        "alice",
        ItemKind::Tweet,
        "interacted",
        "click",
        None,
        Utc::now() - Duration::days(10),
    )
    .await
    .unwrap();

    let page = engine
        .personalized("tok-alice", Pagination::default())
        .await
        .unwrap();

    let score_of = |id: &str| {
        page.items
            .iter()
            .find(|i| i.item_id == id)
            .and_then(|i| i.score)
            .unwrap()
    };
    // interacted: affinity 3 + popularity 2*3; sibling: affinity 3 only.
    assert_eq!(score_of("interacted"), 9);
    assert_eq!(score_of("sibling"), 3);
}

#[tokio::test]
async fn personalized_rejects_invalid_tokens() {
    let (engine, db) = engine().await;
    db.add_user("alice", None, Some("tok-alice"), None)
        .await
        .unwrap();
    db.set_deactivated("alice", true).await.unwrap();

    assert!(matches!(
        engine.personalized("tok-alice", Pagination::default()).await,
        Err(FeedError::InvalidToken)
    ));
    assert!(matches!(
        engine.personalized("no-such", Pagination::default()).await,
        Err(FeedError::InvalidToken)
    ));
}

#[tokio::test]
async fn trending_ranks_by_favorites_plus_weighted_interactions() {
    let (engine, db) = engine().await;
    add_post(&db, "favored", ItemKind::Tweet, "", None, 10, 30).await;
    add_post(&db, "discussed", ItemKind::Tweet, "", None, 0, 20).await;
    for n in 0..3 {
        db.record_interaction(
            "someone",
            ItemKind::Tweet,
            "discussed",
            "click",
            None,
            minutes_ago(5 + n),
        )
        .await
        .unwrap();
    }

    let page = engine.trending(None, Pagination::default()).await.unwrap();
    let ids: Vec<&str> = page.items.iter().map(|i| i.item_id.as_str()).collect();
    // discussed: 0 + 3*5 = 15; favored: 10.
    assert_eq!(ids, vec!["discussed", "favored"]);
}

#[tokio::test]
async fn trending_window_tracks_the_most_recent_tweet() {
    let (engine, db) = engine().await;
    add_post(&db, "current", ItemKind::Tweet, "", None, 1, 10).await;
    db.add_post(
        "stale",
        ItemKind::Tweet,
        "poster",
        "old body",
        Utc::now() - Duration::days(5),
        0,
        100,
        None,
        "",
        None,
    )
    .await
    .unwrap();
    // Bluesky posts never participate regardless of recency.
    add_post(&db, "skeet", ItemKind::Bluesky, "", None, 100, 5).await;

    let page = engine.trending(None, Pagination::default()).await.unwrap();
    let ids: Vec<&str> = page.items.iter().map(|i| i.item_id.as_str()).collect();
    assert_eq!(ids, vec!["current"]);
}

#[tokio::test]
async fn trending_is_region_scoped_and_empty_without_tweets() {
    let (engine, db) = engine().await;
    let empty = engine.trending(None, Pagination::default()).await.unwrap();
    assert_eq!(empty.status, FeedStatus::Empty);

    add_post(&db, "us-tweet", ItemKind::Tweet, "", Some("US"), 1, 10).await;
    add_post(&db, "uk-tweet", ItemKind::Tweet, "", Some("UK"), 5, 10).await;

    let page = engine
        .trending(Some("US"), Pagination::default())
        .await
        .unwrap();
    let ids: Vec<&str> = page.items.iter().map(|i| i.item_id.as_str()).collect();
    assert_eq!(ids, vec!["us-tweet"]);
}

#[tokio::test]
async fn friends_reposts_embed_originals_newest_repost_first() {
    let (engine, db) = engine().await;
    db.add_user("alice", None, Some("tok-alice"), None)
        .await
        .unwrap();
    for friend in ["bob", "carol"] {
        db.add_user(friend, None, None, None).await.unwrap();
        db.request_follow("alice", friend).await.unwrap();
        db.accept_follow_request("alice", friend).await.unwrap();
    }

    let article_id = add_article(&db, "shared-article", "News", None, 500).await;
    add_post(&db, "shared-post", ItemKind::Tweet, "", None, 0, 500).await;

    db.add_repost("bob", ItemKind::Article, &article_id.to_string(), minutes_ago(40))
        .await
        .unwrap();
    db.add_repost("bob", ItemKind::Tweet, "shared-post", minutes_ago(20))
        .await
        .unwrap();
    // The same item reposted by another friend stays a separate entry.
    db.add_repost("carol", ItemKind::Tweet, "shared-post", minutes_ago(10))
        .await
        .unwrap();

    let page = engine
        .friends_reposts("tok-alice", Pagination::default())
        .await
        .unwrap();

    assert_eq!(page.items.len(), 3);
    assert_eq!(page.items[0].reposted_by, "carol");
    assert_eq!(page.items[1].reposted_by, "bob");
    assert!(matches!(page.items[0].original, ContentItem::Post(_)));
    assert_eq!(page.items[2].content_type, ItemKind::Article);
    match &page.items[2].original {
        ContentItem::Article(article) => assert_eq!(article.id, article_id),
        other => panic!("expected an article, got {:?}", other),
    }
}

#[tokio::test]
async fn repost_feeds_cap_the_limit_at_fifty() {
    let (engine, db) = engine().await;
    db.add_user("alice", None, Some("tok-alice"), None)
        .await
        .unwrap();

    let oversized = Pagination::new(1, 51).unwrap();
    assert!(matches!(
        engine.friends_reposts("tok-alice", oversized).await,
        Err(FeedError::Validation(_))
    ));
    assert!(matches!(
        engine.reposts_by_user("alice", oversized).await,
        Err(FeedError::Validation(_))
    ));

    // 50 itself is allowed.
    let page = engine
        .friends_reposts("tok-alice", Pagination::new(1, 50).unwrap())
        .await
        .unwrap();
    assert_eq!(page.status, FeedStatus::Empty);
}

#[tokio::test]
async fn reposts_by_user_is_scoped_to_that_user() {
    let (engine, db) = engine().await;
    add_post(&db, "shared", ItemKind::Tweet, "", None, 0, 60).await;
    db.add_repost("bob", ItemKind::Tweet, "shared", minutes_ago(30))
        .await
        .unwrap();
    db.add_repost("carol", ItemKind::Tweet, "shared", minutes_ago(20))
        .await
        .unwrap();

    let page = engine
        .reposts_by_user("bob", Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].reposted_by, "bob");
}

#[tokio::test]
async fn reposts_of_deleted_originals_are_dropped() {
    let (engine, db) = engine().await;
    db.add_repost("bob", ItemKind::Tweet, "gone", minutes_ago(10))
        .await
        .unwrap();

    let page = engine
        .reposts_by_user("bob", Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.status, FeedStatus::Empty);
}

#[tokio::test]
async fn search_spans_both_content_kinds() {
    let (engine, db) = engine().await;
    db.add_article(
        "https://example.com/quantum",
        "Quantum leap announced",
        "Science",
        Some("A quantum computing milestone"),
        None,
        minutes_ago(30),
        None,
        None,
        None,
    )
    .await
    .unwrap();
    db.add_post(
        "quantum-post",
        ItemKind::Tweet,
        "poster",
        "big quantum news",
        minutes_ago(10),
        0,
        0,
        None,
        "",
        None,
    )
    .await
    .unwrap();
    add_post(&db, "unrelated", ItemKind::Tweet, "", None, 0, 5).await;

    let page = engine
        .search("quantum", Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].item_id, "quantum-post");
    assert_eq!(page.items[1].item_type, ItemKind::Article);

    assert!(matches!(
        engine.search("   ", Pagination::default()).await,
        Err(FeedError::Validation(_))
    ));
}
