use serde::{Deserialize, Serialize};

/// Read-only view shared by every picture-like record, wherever it came from.
pub trait Picture {
    fn id(&self) -> i64;
    fn album_id(&self) -> i64;
    fn title(&self) -> &str;
    fn url(&self) -> &str;
    fn thumbnail_url(&self) -> &str;

    /// Copy the picture into its stored form.
    fn to_entity(&self) -> PictureEntity {
        PictureEntity {
            id: self.id(),
            album_id: self.album_id(),
            title: self.title().to_string(),
            url: self.url().to_string(),
            thumbnail_url: self.thumbnail_url().to_string(),
        }
    }
}

/// Picture as returned by `GET /photos` and `GET /photos/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PictureRemote {
    pub id: i64,
    pub album_id: i64,
    pub title: String,
    pub url: String,
    pub thumbnail_url: String,
}

/// Album as returned by `GET /albums/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AlbumRemote {
    pub user_id: i64,
    pub id: i64,
    pub title: String,
}

/// Row of the `picture` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PictureEntity {
    pub id: i64,
    #[sqlx(rename = "albumId")]
    pub album_id: i64,
    pub title: String,
    pub url: String,
    #[sqlx(rename = "thumbnailUrl")]
    pub thumbnail_url: String,
}

impl Picture for PictureRemote {
    fn id(&self) -> i64 {
        self.id
    }
    fn album_id(&self) -> i64 {
        self.album_id
    }
    fn title(&self) -> &str {
        &self.title
    }
    fn url(&self) -> &str {
        &self.url
    }
    fn thumbnail_url(&self) -> &str {
        &self.thumbnail_url
    }
}

impl Picture for PictureEntity {
    fn id(&self) -> i64 {
        self.id
    }
    fn album_id(&self) -> i64 {
        self.album_id
    }
    fn title(&self) -> &str {
        &self.title
    }
    fn url(&self) -> &str {
        &self.url
    }
    fn thumbnail_url(&self) -> &str {
        &self.thumbnail_url
    }

    fn to_entity(&self) -> PictureEntity {
        self.clone()
    }
}
