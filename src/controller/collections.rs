//! Liked and playlist collection actions

use std::sync::Arc;

use crate::model::{CollectionKind, Track};
use super::SessionController;

impl SessionController {
    pub async fn like(&self, track_id: &str) {
        let added = self.model.add_to_collection(CollectionKind::Liked, track_id).await;
        tracing::info!(track_id, added, "Liked song");
    }

    pub async fn add_to_playlist(&self, track_id: &str) {
        let added = self.model.add_to_collection(CollectionKind::Playlist, track_id).await;
        tracing::info!(track_id, added, "Added song to playlist");
    }

    pub async fn view_liked(&self) {
        tracing::debug!("Showing liked songs");
        self.model.show_collection(CollectionKind::Liked).await;
    }

    pub async fn view_playlist(&self) {
        tracing::debug!("Showing playlist songs");
        self.model.show_collection(CollectionKind::Playlist).await;
    }

    pub async fn liked_tracks(&self) -> Vec<Arc<Track>> {
        self.model.collection(CollectionKind::Liked).await
    }

    pub async fn playlist_tracks(&self) -> Vec<Arc<Track>> {
        self.model.collection(CollectionKind::Playlist).await
    }
}
