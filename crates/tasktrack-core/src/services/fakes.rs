//! Hand-rolled port fakes for service tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{CommentQuery, CommentSummary, NewComment, TaskComment, TaskId};
use crate::error::RepoError;
use crate::ports::{CommentCache, CommentRepository, CounterStore, StoreError};

#[derive(Default)]
pub struct FakeCounterStore {
    counters: Mutex<HashMap<String, u64>>,
    calls: AtomicUsize,
    fail: bool,
}

impl FakeCounterStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn value(&self, key: &str) -> u64 {
        self.counters.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CounterStore for FakeCounterStore {
    async fn increment(&self, key: &str, _window: Duration) -> Result<u64, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(StoreError::Connection("connection refused".to_string()));
        }
        let mut counters = self.counters.lock().unwrap();
        let count = counters.entry(key.to_string()).or_insert(0);
        *count += 1;
        Ok(*count)
    }
}

#[derive(Default)]
pub struct FakeCommentCache {
    entries: Mutex<HashMap<TaskId, Vec<CommentSummary>>>,
    pub fail: AtomicBool,
    /// Park every `set` after counting it, before anything is written.
    pub stall_set: AtomicBool,
    pub sets: AtomicUsize,
    pub invalidations: AtomicUsize,
}

impl FakeCommentCache {
    pub fn failing() -> Self {
        let cache = Self::default();
        cache.fail.store(true, Ordering::SeqCst);
        cache
    }

    pub fn preload(&self, task_id: TaskId, comments: Vec<CommentSummary>) {
        self.entries.lock().unwrap().insert(task_id, comments);
    }

    pub fn peek(&self, task_id: TaskId) -> Option<Vec<CommentSummary>> {
        self.entries.lock().unwrap().get(&task_id).cloned()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Connection("cache down".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CommentCache for FakeCommentCache {
    async fn get(&self, task_id: TaskId) -> Result<Option<Vec<CommentSummary>>, StoreError> {
        self.check()?;
        Ok(self.peek(task_id))
    }

    async fn set(
        &self,
        task_id: TaskId,
        comments: &[CommentSummary],
        _ttl: Duration,
    ) -> Result<(), StoreError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        if self.stall_set.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.check()?;
        self.preload(task_id, comments.to_vec());
        Ok(())
    }

    async fn invalidate(&self, task_id: TaskId) -> Result<(), StoreError> {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.entries.lock().unwrap().remove(&task_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeCommentRepository {
    rows: Mutex<Vec<TaskComment>>,
    /// Park every `query` after counting it.
    pub stall_query: AtomicBool,
    pub queries: AtomicUsize,
}

impl FakeCommentRepository {
    pub fn seed(&self, task_id: TaskId, message: &str, created_at: DateTime<Utc>) -> i64 {
        let mut rows = self.rows.lock().unwrap();
        let id = rows.len() as i64 + 1;
        rows.push(TaskComment {
            id,
            task_id,
            author_id: 1,
            message: message.to_string(),
            created_at,
            modified_at: None,
            deleted_at: None,
        });
        id
    }

    pub fn row(&self, id: i64) -> Option<TaskComment> {
        self.rows.lock().unwrap().iter().find(|c| c.id == id).cloned()
    }

    fn modify(
        &self,
        id: i64,
        apply: impl FnOnce(&mut TaskComment),
    ) -> Result<TaskId, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows.iter_mut().find(|c| c.id == id).ok_or(RepoError::NotFound)?;
        apply(row);
        Ok(row.task_id)
    }
}

#[async_trait]
impl CommentRepository for FakeCommentRepository {
    async fn add(&self, comment: NewComment) -> Result<i64, RepoError> {
        Ok(self.seed(comment.task_id, &comment.message, comment.created_at))
    }

    async fn update(
        &self,
        id: i64,
        message: &str,
        modified_at: DateTime<Utc>,
    ) -> Result<TaskId, RepoError> {
        self.modify(id, |row| {
            row.message = message.to_string();
            row.modified_at = Some(modified_at);
        })
    }

    async fn set_deleted(&self, id: i64, deleted_at: DateTime<Utc>) -> Result<TaskId, RepoError> {
        self.modify(id, |row| row.deleted_at = Some(deleted_at))
    }

    async fn query(&self, query: CommentQuery) -> Result<Vec<TaskComment>, RepoError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.stall_query.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let mut rows: Vec<TaskComment> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.task_id == query.task_id)
            .filter(|c| query.include_deleted || !c.is_deleted())
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }
}
