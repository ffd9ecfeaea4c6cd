//! End-to-end flows over the in-memory adapters.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use tasktrack_core::domain::{CommentSummary, Decision, NewComment, TaskId};
use tasktrack_core::ports::{CommentCache, CommentRepository, RateLimiter};
use tasktrack_core::services::{
    CommentCacheConfig, CommentReadService, CommentWriteService, CounterRateLimiter,
    RateLimitConfig,
};

use crate::{InMemoryCache, InMemoryCommentRepository, InMemoryCounterStore, KeyValueCommentCache};

fn task(id: i64) -> TaskId {
    TaskId::new(id).unwrap()
}

fn synthetic(task_id: TaskId, n: usize) -> Vec<CommentSummary> {
    (0..n)
        .map(|i| CommentSummary {
            task_id,
            text: format!("synthetic {i}"),
            is_deleted: false,
            observed_at: Utc::now(),
        })
        .collect()
}

#[tokio::test]
async fn test_hundred_and_first_request_is_rejected() {
    let limiter = CounterRateLimiter::new(
        Arc::new(InMemoryCounterStore::new()),
        RateLimitConfig {
            max_requests: 100,
            ..Default::default()
        },
    );
    let token = CancellationToken::new();

    for _ in 0..100 {
        let res = limiter.admit("1.2.3.4", &token).await.unwrap();
        assert_eq!(res.decision, Decision::Allowed);
    }

    let res = limiter.admit("1.2.3.4", &token).await.unwrap();
    assert_eq!(res.decision, Decision::Rejected);
    assert_eq!(res.count, Some(101));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_admissions_observe_distinct_counts() {
    let limiter = Arc::new(CounterRateLimiter::new(
        Arc::new(InMemoryCounterStore::new()),
        RateLimitConfig::default(),
    ));

    let handles: Vec<_> = (0..64)
        .map(|_| {
            let limiter = limiter.clone();
            tokio::spawn(async move {
                limiter
                    .admit("10.1.1.1", &CancellationToken::new())
                    .await
                    .unwrap()
                    .count
                    .unwrap()
            })
        })
        .collect();

    let mut counts: Vec<u64> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    counts.sort_unstable();

    assert_eq!(counts, (1..=64).collect::<Vec<_>>());
}

#[tokio::test(start_paused = true)]
async fn test_window_reopens_after_expiry() {
    let limiter = CounterRateLimiter::new(
        Arc::new(InMemoryCounterStore::new()),
        RateLimitConfig {
            max_requests: 2,
            window: Duration::from_secs(60),
            ..Default::default()
        },
    );
    let token = CancellationToken::new();

    limiter.admit("k", &token).await.unwrap();
    limiter.admit("k", &token).await.unwrap();
    assert!(!limiter.admit("k", &token).await.unwrap().is_allowed());

    tokio::time::advance(Duration::from_secs(61)).await;
    assert!(limiter.admit("k", &token).await.unwrap().is_allowed());
}

#[tokio::test]
async fn test_storage_comments_are_cached_after_first_read() {
    let repo = Arc::new(InMemoryCommentRepository::new());
    let cache = Arc::new(KeyValueCommentCache::new(Arc::new(InMemoryCache::new())));
    let reader = CommentReadService::new(cache.clone(), repo.clone(), &CommentCacheConfig::default());

    let base = Utc::now();
    for i in 0..6 {
        let mut comment = NewComment::new(task(42), 1, format!("comment {i}"));
        comment.created_at = base + chrono::Duration::seconds(i);
        repo.add(comment).await.unwrap();
    }

    let comments = reader
        .get_comments(task(42), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(comments.len(), 6);
    assert!(
        comments
            .windows(2)
            .all(|pair| pair[0].observed_at > pair[1].observed_at)
    );
    assert_eq!(cache.get(task(42)).await.unwrap(), Some(comments));
}

#[tokio::test]
async fn test_cache_wins_over_empty_storage() {
    let repo = Arc::new(InMemoryCommentRepository::new());
    let cache = Arc::new(KeyValueCommentCache::new(Arc::new(InMemoryCache::new())));
    let reader = CommentReadService::new(cache.clone(), repo, &CommentCacheConfig::default());

    let cached = synthetic(task(7), 5);
    cache
        .set(task(7), &cached, Duration::from_secs(5))
        .await
        .unwrap();

    let comments = reader
        .get_comments(task(7), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(comments, cached);
}

#[tokio::test(start_paused = true)]
async fn test_expired_view_is_rebuilt_from_storage() {
    let repo = Arc::new(InMemoryCommentRepository::new());
    let cache = Arc::new(KeyValueCommentCache::new(Arc::new(InMemoryCache::new())));
    let reader = CommentReadService::new(cache.clone(), repo, &CommentCacheConfig::default());

    cache
        .set(task(7), &synthetic(task(7), 5), Duration::from_secs(5))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(5)).await;

    let comments = reader
        .get_comments(task(7), &CancellationToken::new())
        .await
        .unwrap();

    assert!(comments.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_writes_become_visible_after_ttl() {
    let repo = Arc::new(InMemoryCommentRepository::new());
    let cache = Arc::new(KeyValueCommentCache::new(Arc::new(InMemoryCache::new())));
    let config = CommentCacheConfig {
        ttl: Duration::from_secs(10),
        invalidate_on_write: false,
    };
    let reader = CommentReadService::new(cache.clone(), repo.clone(), &config);
    let writer = CommentWriteService::new(repo, cache, &config);
    let token = CancellationToken::new();

    assert!(reader.get_comments(task(3), &token).await.unwrap().is_empty());

    writer.add(task(3), 1, "late arrival", &token).await.unwrap();
    assert!(reader.get_comments(task(3), &token).await.unwrap().is_empty());

    tokio::time::advance(Duration::from_secs(10)).await;
    let comments = reader.get_comments(task(3), &token).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].text, "late arrival");
}
