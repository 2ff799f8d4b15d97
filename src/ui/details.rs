//! Detail screen: one picture plus the title of its album.

use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::scope::{RequestCell, TaskScope};
use crate::api::ApiError;
use crate::model::{AlbumRemote, PictureRemote};
use crate::repository::NetworkPicturesRepository;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailsState {
    Loading,
    Success {
        picture: PictureRemote,
        album: AlbumRemote,
    },
    Error,
}

impl DetailsState {
    pub fn is_loading(&self) -> bool {
        matches!(self, DetailsState::Loading)
    }
}

pub struct DetailsController {
    picture_id: i64,
    network: NetworkPicturesRepository,
    state: RequestCell<DetailsState>,
    scope: TaskScope,
}

impl DetailsController {
    /// Start loading `picture_id`. Must be called from within a Tokio runtime.
    pub fn new(network: NetworkPicturesRepository, picture_id: i64) -> Self {
        let controller = Self {
            picture_id,
            network,
            state: RequestCell::new(DetailsState::Loading),
            scope: TaskScope::default(),
        };
        controller.retry();
        controller
    }

    pub fn picture_id(&self) -> i64 {
        self.picture_id
    }

    pub fn state(&self) -> watch::Receiver<DetailsState> {
        self.state.subscribe()
    }

    /// Run both fetches again from `Loading`.
    pub fn retry(&self) {
        let request = self.state.begin(DetailsState::Loading);
        let network = self.network.clone();
        let id = self.picture_id;
        self.scope.spawn(async move {
            let next = match load(&network, id).await {
                Ok((picture, album)) => {
                    info!(id, album_id = album.id, "picture details loaded");
                    DetailsState::Success { picture, album }
                }
                Err(err) => {
                    warn!(%err, id, "failed to load picture details");
                    DetailsState::Error
                }
            };
            let generation = request.generation();
            if !request.finish(next) {
                debug!(generation, id, "discarded superseded picture details");
            }
        });
    }
}

/// The picture, then its album. Either failure fails the whole load.
#[instrument(skip(network))]
async fn load(
    network: &NetworkPicturesRepository,
    id: i64,
) -> Result<(PictureRemote, AlbumRemote), ApiError> {
    let picture = network.photo(id).await?;
    let album = network.album(picture.album_id).await?;
    Ok((picture, album))
}
