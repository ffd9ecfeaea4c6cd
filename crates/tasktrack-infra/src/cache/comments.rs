//! Comment cache stored as JSON in any key/value [`Cache`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use tasktrack_core::domain::{CommentSummary, TaskId};
use tasktrack_core::ports::{Cache, CommentCache, StoreError};

pub const DEFAULT_KEY_PREFIX: &str = "comment_tasks";

/// Stores each task's view as one JSON array under `{prefix}:{task_id}`.
///
/// A view is written with a single `set`, so readers see either the previous
/// value or the complete new one.
pub struct KeyValueCommentCache {
    cache: Arc<dyn Cache>,
    key_prefix: String,
}

impl KeyValueCommentCache {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self::with_prefix(cache, DEFAULT_KEY_PREFIX)
    }

    pub fn with_prefix(cache: Arc<dyn Cache>, key_prefix: impl Into<String>) -> Self {
        Self {
            cache,
            key_prefix: key_prefix.into(),
        }
    }

    pub fn make_key(&self, task_id: TaskId) -> String {
        format!("{}:{}", self.key_prefix, task_id)
    }
}

#[async_trait]
impl CommentCache for KeyValueCommentCache {
    async fn get(&self, task_id: TaskId) -> Result<Option<Vec<CommentSummary>>, StoreError> {
        let Some(raw) = self.cache.get(&self.make_key(task_id)).await? else {
            return Ok(None);
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }

    async fn set(
        &self,
        task_id: TaskId,
        comments: &[CommentSummary],
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let raw =
            serde_json::to_string(comments).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.cache.set(&self.make_key(task_id), &raw, Some(ttl)).await
    }

    async fn invalidate(&self, task_id: TaskId) -> Result<(), StoreError> {
        self.cache.delete(&self.make_key(task_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use chrono::{TimeZone, Utc};

    fn summaries(task_id: TaskId) -> Vec<CommentSummary> {
        vec![
            CommentSummary {
                task_id,
                text: "newest".to_string(),
                is_deleted: false,
                observed_at: Utc.with_ymd_and_hms(2023, 9, 17, 14, 38, 0).unwrap(),
            },
            CommentSummary {
                task_id,
                text: "older, flagged".to_string(),
                is_deleted: true,
                observed_at: Utc.with_ymd_and_hms(2023, 9, 17, 14, 36, 0).unwrap(),
            },
        ]
    }

    #[tokio::test]
    async fn test_set_then_get_preserves_order_and_flags() {
        let cache = KeyValueCommentCache::new(Arc::new(InMemoryCache::new()));
        let task_id = TaskId::new(42).unwrap();

        cache
            .set(task_id, &summaries(task_id), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(cache.get(task_id).await.unwrap(), Some(summaries(task_id)));
    }

    #[tokio::test]
    async fn test_empty_view_is_cached() {
        let cache = KeyValueCommentCache::new(Arc::new(InMemoryCache::new()));
        let task_id = TaskId::new(1).unwrap();

        assert_eq!(cache.get(task_id).await.unwrap(), None);
        cache.set(task_id, &[], Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get(task_id).await.unwrap(), Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_key_layout_and_corrupt_payload() {
        let backing = Arc::new(InMemoryCache::new());
        let cache = KeyValueCommentCache::new(backing.clone());
        let task_id = TaskId::new(7).unwrap();
        assert_eq!(cache.make_key(task_id), "comment_tasks:7");

        backing.set("comment_tasks:7", "not json", None).await.unwrap();
        let err = cache.get(task_id).await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = KeyValueCommentCache::new(Arc::new(InMemoryCache::new()));
        let task_id = TaskId::new(3).unwrap();
        cache
            .set(task_id, &summaries(task_id), Duration::from_secs(60))
            .await
            .unwrap();

        cache.invalidate(task_id).await.unwrap();
        assert_eq!(cache.get(task_id).await.unwrap(), None);
    }
}
