//! List screen: pictures from the API next to the pictures saved locally.

use futures::StreamExt;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::scope::{PendingWrites, RequestCell, TaskScope};
use crate::model::{Picture, PictureEntity, PictureRemote};
use crate::repository::{AppContainer, NetworkPicturesRepository, OfflinePicturesRepository};

/// Outcome of the most recent `GET /photos`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HomeNetworkState {
    Loading,
    Success(Vec<PictureRemote>),
    Error,
}

impl HomeNetworkState {
    pub fn is_loading(&self) -> bool {
        matches!(self, HomeNetworkState::Loading)
    }
}

/// Mirror of the local store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HomeOfflineState {
    pub pictures: Vec<PictureEntity>,
}

pub struct HomeController {
    network: NetworkPicturesRepository,
    offline: OfflinePicturesRepository,
    network_state: RequestCell<HomeNetworkState>,
    offline_state: watch::Receiver<HomeOfflineState>,
    scope: TaskScope,
    writes: PendingWrites,
}

impl HomeController {
    /// Subscribe to the saved pictures and start the first network fetch.
    /// Must be called from within a Tokio runtime.
    pub fn new(container: &AppContainer) -> Self {
        let (offline_tx, offline_state) = watch::channel(HomeOfflineState::default());
        let controller = Self {
            network: container.network.clone(),
            offline: container.offline.clone(),
            network_state: RequestCell::new(HomeNetworkState::Loading),
            offline_state,
            scope: TaskScope::default(),
            writes: PendingWrites::default(),
        };
        controller.follow_saved_pictures(offline_tx);
        controller.refresh();
        controller
    }

    pub fn network_state(&self) -> watch::Receiver<HomeNetworkState> {
        self.network_state.subscribe()
    }

    pub fn offline_state(&self) -> watch::Receiver<HomeOfflineState> {
        self.offline_state.clone()
    }

    /// Re-enter `Loading` and fetch the picture list again.
    pub fn refresh(&self) {
        let request = self.network_state.begin(HomeNetworkState::Loading);
        let network = self.network.clone();
        self.scope.spawn(async move {
            let next = match network.photos().await {
                Ok(photos) => {
                    info!(count = photos.len(), "picture list loaded");
                    HomeNetworkState::Success(photos)
                }
                Err(err) => {
                    warn!(%err, "failed to load picture list");
                    HomeNetworkState::Error
                }
            };
            let generation = request.generation();
            if !request.finish(next) {
                debug!(generation, "discarded superseded picture list");
            }
        });
    }

    /// Store the picture locally. The change shows up through `offline_state`.
    pub fn save(&self, picture: &impl Picture) {
        let entity = picture.to_entity();
        let offline = self.offline.clone();
        self.writes.spawn(async move {
            match offline.insert(&entity).await {
                Ok(true) => info!(id = entity.id, "picture saved"),
                Ok(false) => debug!(id = entity.id, "picture already saved"),
                Err(err) => warn!(%err, id = entity.id, "failed to save picture"),
            }
        });
    }

    /// Remove the picture from the local store. The change shows up through `offline_state`.
    pub fn delete(&self, picture: &impl Picture) {
        let entity = picture.to_entity();
        let offline = self.offline.clone();
        self.writes.spawn(async move {
            match offline.delete(&entity).await {
                Ok(true) => info!(id = entity.id, "picture deleted"),
                Ok(false) => debug!(id = entity.id, "picture was not saved"),
                Err(err) => warn!(%err, id = entity.id, "failed to delete picture"),
            }
        });
    }

    /// Wait for every save and delete started so far. Dropping the controller
    /// cancels fetches but never writes.
    pub async fn flush(&self) {
        self.writes.flush().await;
    }

    /// Picture with `id` in the last successful network list.
    pub fn remote_picture(&self, id: i64) -> Option<PictureRemote> {
        match &*self.network_state.borrow() {
            HomeNetworkState::Success(photos) => photos.iter().find(|p| p.id == id).cloned(),
            _ => None,
        }
    }

    /// Picture with `id` among the saved pictures.
    pub fn saved_picture(&self, id: i64) -> Option<PictureEntity> {
        self.offline_state
            .borrow()
            .pictures
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    fn follow_saved_pictures(&self, tx: watch::Sender<HomeOfflineState>) {
        let mut pictures = self.offline.pictures_stream();
        self.scope.spawn(async move {
            while let Some(next) = pictures.next().await {
                match next {
                    Ok(rows) => {
                        tx.send_replace(HomeOfflineState { pictures: rows });
                    }
                    Err(err) => warn!(%err, "failed to read saved pictures"),
                }
            }
        });
    }
}
