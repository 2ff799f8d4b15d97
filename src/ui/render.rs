//! Plain-text rendering of the two screens.

use std::fmt::Write;

use super::details::DetailsState;
use super::home::{HomeNetworkState, HomeOfflineState};
use crate::model::Picture;

/// Rows shown per list before the rest is summarised.
pub const MAX_ROWS: usize = 25;

pub fn render_home(network: &HomeNetworkState, offline: &HomeOfflineState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== My Pictures ==");
    let _ = writeln!(out);
    let _ = writeln!(out, "-- Saved pictures --");
    if offline.pictures.is_empty() {
        let _ = writeln!(out, "  (nothing saved yet)");
    } else {
        write_rows(&mut out, &offline.pictures);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "-- Network --");
    match network {
        HomeNetworkState::Loading => {
            let _ = writeln!(out, "  Loading...");
        }
        HomeNetworkState::Error => {
            let _ = writeln!(out, "  Loading failed. Type `retry` to try again.");
        }
        HomeNetworkState::Success(photos) if photos.is_empty() => {
            let _ = writeln!(out, "  (no pictures)");
        }
        HomeNetworkState::Success(photos) => write_rows(&mut out, photos),
    }
    let _ = writeln!(out);
    let _ = write!(
        out,
        "commands: show <id> | save <id> | delete <id> | retry | quit"
    );
    out
}

pub fn render_details(picture_id: i64, state: &DetailsState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== Picture {picture_id} ==");
    match state {
        DetailsState::Loading => {
            let _ = writeln!(out, "  Loading...");
        }
        DetailsState::Error => {
            let _ = writeln!(out, "  Loading failed. Type `retry` to try again.");
        }
        DetailsState::Success { picture, album } => {
            let _ = writeln!(out, "  Id:          {}", picture.id);
            let _ = writeln!(out, "  Title:       {}", picture.title);
            let _ = writeln!(out, "  Album id:    {}", picture.album_id);
            let _ = writeln!(out, "  Album title: {}", album.title);
            let _ = writeln!(out, "  Image:       {}", picture.url);
            let _ = writeln!(out, "  Thumbnail:   {}", picture.thumbnail_url);
        }
    }
    let _ = writeln!(out);
    let _ = write!(out, "commands: retry | back | quit");
    out
}

fn write_rows<P: Picture>(out: &mut String, pictures: &[P]) {
    for picture in pictures.iter().take(MAX_ROWS) {
        let _ = writeln!(out, "  [{:>5}] {}", picture.id(), picture.title());
    }
    if pictures.len() > MAX_ROWS {
        let _ = writeln!(out, "  ... showing {} of {}", MAX_ROWS, pictures.len());
    }
}
