use super::repo::{self, Pool};
use crate::model::PictureEntity;
use futures::stream::{self, BoxStream, StreamExt};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Shared handle to the saved pictures.
///
/// Clones share the pool and the change channel, so a write through any clone
/// wakes every live query opened on any other.
#[derive(Clone)]
pub struct PictureStore {
    pool: Pool,
    changes: Arc<watch::Sender<u64>>,
}

impl std::fmt::Debug for PictureStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PictureStore")
            .field("version", &*self.changes.borrow())
            .finish_non_exhaustive()
    }
}

impl PictureStore {
    pub fn new(pool: Pool) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            pool,
            changes: Arc::new(changes),
        }
    }

    /// Insert unless the id is already present. Returns whether a row was written.
    pub async fn insert(&self, picture: &PictureEntity) -> sqlx::Result<bool> {
        let inserted = repo::insert_picture(&self.pool, picture).await?;
        if inserted {
            self.notify();
        }
        Ok(inserted)
    }

    /// Delete the stored row equal to `picture`. Absent rows are a no-op.
    pub async fn delete(&self, picture: &PictureEntity) -> sqlx::Result<bool> {
        let deleted = repo::delete_picture(&self.pool, picture).await?;
        if deleted {
            self.notify();
        }
        Ok(deleted)
    }

    pub async fn all(&self) -> sqlx::Result<Vec<PictureEntity>> {
        repo::all_pictures(&self.pool).await
    }

    pub async fn get(&self, id: i64) -> sqlx::Result<Option<PictureEntity>> {
        repo::picture_by_id(&self.pool, id).await
    }

    /// Live view of the whole table: the current rows first, then a fresh
    /// snapshot after every write that changed something.
    pub fn watch_all(&self) -> BoxStream<'static, sqlx::Result<Vec<PictureEntity>>> {
        self.live(|pool| async move { repo::all_pictures(&pool).await })
    }

    /// Live view of a single id; yields `None` while it is not stored.
    pub fn watch(&self, id: i64) -> BoxStream<'static, sqlx::Result<Option<PictureEntity>>> {
        self.live(move |pool| async move { repo::picture_by_id(&pool, id).await })
    }

    fn live<T, F, Fut>(&self, query: F) -> BoxStream<'static, sqlx::Result<T>>
    where
        T: Send + 'static,
        F: Fn(Pool) -> Fut + Send + 'static,
        Fut: Future<Output = sqlx::Result<T>> + Send + 'static,
    {
        let pool = self.pool.clone();
        // A fresh subscription treats the current version as seen.
        let rx = self.changes.subscribe();
        stream::unfold((rx, true), move |(mut rx, first)| {
            let next = query(pool.clone());
            async move {
                if !first && rx.changed().await.is_err() {
                    return None;
                }
                Some((next.await, (rx, false)))
            }
        })
        .boxed()
    }

    fn notify(&self) {
        self.changes.send_modify(|version| *version = version.wrapping_add(1));
        debug!(version = *self.changes.borrow(), "picture table changed");
    }
}
