//! Repository facade: the presentation layer reads pictures through these
//! adapters instead of talking to the HTTP client or the store directly.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;
use tracing::info;

use crate::api::{ApiError, JsonPlaceholderClient, PicturesApi};
use crate::config::Config;
use crate::db::{self, PictureStore};
use crate::model::{AlbumRemote, Picture, PictureEntity, PictureRemote};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Remote(#[from] ApiError),
    #[error("local store error: {0}")]
    Store(#[from] sqlx::Error),
}

/// Read side shared by the network and offline adapters.
#[async_trait]
pub trait PicturesRepository: Send + Sync {
    type Item: Picture + Send;

    async fn all_pictures(&self) -> Result<Vec<Self::Item>, RepositoryError>;

    async fn picture(&self, id: i64) -> Result<Option<Self::Item>, RepositoryError>;
}

#[derive(Clone)]
pub struct NetworkPicturesRepository {
    api: Arc<dyn PicturesApi>,
}

impl NetworkPicturesRepository {
    pub fn new(api: Arc<dyn PicturesApi>) -> Self {
        Self { api }
    }

    pub async fn photos(&self) -> Result<Vec<PictureRemote>, ApiError> {
        self.api.photos().await
    }

    pub async fn photo(&self, id: i64) -> Result<PictureRemote, ApiError> {
        self.api.photo(id).await
    }

    pub async fn album(&self, id: i64) -> Result<AlbumRemote, ApiError> {
        self.api.album(id).await
    }
}

#[async_trait]
impl PicturesRepository for NetworkPicturesRepository {
    type Item = PictureRemote;

    async fn all_pictures(&self) -> Result<Vec<PictureRemote>, RepositoryError> {
        Ok(self.api.photos().await?)
    }

    /// The API answers an unknown id with 404.
    async fn picture(&self, id: i64) -> Result<Option<PictureRemote>, RepositoryError> {
        match self.api.photo(id).await {
            Ok(photo) => Ok(Some(photo)),
            Err(ApiError::Http { status, .. }) if status == reqwest::StatusCode::NOT_FOUND => {
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct OfflinePicturesRepository {
    store: PictureStore,
}

impl OfflinePicturesRepository {
    pub fn new(store: PictureStore) -> Self {
        Self { store }
    }

    pub fn pictures_stream(&self) -> BoxStream<'static, sqlx::Result<Vec<PictureEntity>>> {
        self.store.watch_all()
    }

    pub fn picture_stream(&self, id: i64) -> BoxStream<'static, sqlx::Result<Option<PictureEntity>>> {
        self.store.watch(id)
    }

    pub async fn insert(&self, picture: &PictureEntity) -> Result<bool, RepositoryError> {
        Ok(self.store.insert(picture).await?)
    }

    pub async fn delete(&self, picture: &PictureEntity) -> Result<bool, RepositoryError> {
        Ok(self.store.delete(picture).await?)
    }
}

#[async_trait]
impl PicturesRepository for OfflinePicturesRepository {
    type Item = PictureEntity;

    async fn all_pictures(&self) -> Result<Vec<PictureEntity>, RepositoryError> {
        Ok(self.store.all().await?)
    }

    async fn picture(&self, id: i64) -> Result<Option<PictureEntity>, RepositoryError> {
        Ok(self.store.get(id).await?)
    }
}

/// Both adapters, built once and shared by every screen.
#[derive(Clone)]
pub struct AppContainer {
    pub network: NetworkPicturesRepository,
    pub offline: OfflinePicturesRepository,
}

impl AppContainer {
    pub fn new(api: Arc<dyn PicturesApi>, store: PictureStore) -> Self {
        Self {
            network: NetworkPicturesRepository::new(api),
            offline: OfflinePicturesRepository::new(store),
        }
    }

    /// Open the store at `database_url` (migrating it) and point the HTTP
    /// client at the configured API.
    pub async fn from_config(cfg: &Config, database_url: &str) -> Result<Self> {
        let pool = db::init_pool(database_url).await?;
        db::run_migrations(&pool).await?;
        let client =
            JsonPlaceholderClient::from_config(cfg).context("failed to build HTTP client")?;
        info!(base_url = %client.base_url(), "picture API client ready");
        Ok(Self::new(Arc::new(client), PictureStore::new(pool)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MissingApi;

    #[async_trait]
    impl PicturesApi for MissingApi {
        async fn photos(&self) -> Result<Vec<PictureRemote>, ApiError> {
            Ok(Vec::new())
        }

        async fn photo(&self, _id: i64) -> Result<PictureRemote, ApiError> {
            Err(ApiError::Http {
                status: reqwest::StatusCode::NOT_FOUND,
                body: "{}".into(),
            })
        }

        async fn album(&self, _id: i64) -> Result<AlbumRemote, ApiError> {
            Err(ApiError::Http {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                body: String::new(),
            })
        }
    }

    #[tokio::test]
    async fn network_picture_maps_not_found_to_none() {
        let repo = NetworkPicturesRepository::new(Arc::new(MissingApi));
        assert!(repo.picture(4).await.unwrap().is_none());
        assert!(repo.all_pictures().await.unwrap().is_empty());
        assert!(matches!(
            repo.album(1).await,
            Err(ApiError::Http { status, .. }) if status.is_server_error()
        ));
    }

    #[tokio::test]
    async fn offline_picture_stream_follows_save_and_delete() {
        use futures::StreamExt;
        use std::time::Duration;

        let pool = db::init_pool("sqlite::memory:").await.unwrap();
        db::run_migrations(&pool).await.unwrap();
        let repo = OfflinePicturesRepository::new(PictureStore::new(pool));
        let entity = PictureEntity {
            id: 3,
            album_id: 1,
            title: "T".into(),
            url: "U".into(),
            thumbnail_url: "TU".into(),
        };

        async fn next(
            stream: &mut BoxStream<'static, sqlx::Result<Option<PictureEntity>>>,
        ) -> Option<PictureEntity> {
            tokio::time::timeout(Duration::from_secs(5), stream.next())
                .await
                .expect("stream did not emit")
                .expect("stream ended")
                .unwrap()
        }

        let mut three = repo.picture_stream(3);
        assert_eq!(next(&mut three).await, None);

        assert!(repo.insert(&entity).await.unwrap());
        assert_eq!(next(&mut three).await, Some(entity.clone()));
        assert_eq!(repo.picture(3).await.unwrap(), Some(entity.clone()));

        assert!(repo.delete(&entity).await.unwrap());
        assert_eq!(next(&mut three).await, None);
        assert!(repo.picture(3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn container_from_config_opens_store() {
        let cfg = Config::default();
        let container = AppContainer::from_config(&cfg, "sqlite::memory:")
            .await
            .unwrap();
        assert!(container.offline.all_pictures().await.unwrap().is_empty());
    }
}
