//! Liked and playlist collections for the session

use std::sync::Arc;

use super::types::{Listing, Track};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollectionKind {
    Liked,
    Playlist,
}

impl CollectionKind {
    pub fn listing(self) -> Listing {
        match self {
            Self::Liked => Listing::Liked,
            Self::Playlist => Listing::Playlist,
        }
    }
}

/// Append-only track collections built from whatever is on screen.
///
/// Entries are not deduplicated: adding a track twice stores it twice.
#[derive(Debug, Default)]
pub struct Collections {
    liked: Vec<Arc<Track>>,
    playlist: Vec<Arc<Track>>,
}

impl Collections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the track with `track_id` from `current` to the collection.
    /// Returns false, leaving the collection alone, when the id is not on screen.
    pub fn add_from(&mut self, kind: CollectionKind, track_id: &str, current: &[Arc<Track>]) -> bool {
        let Some(track) = current.iter().find(|t| t.id == track_id) else {
            return false;
        };
        self.entries_mut(kind).push(Arc::clone(track));
        true
    }

    pub fn snapshot(&self, kind: CollectionKind) -> Vec<Arc<Track>> {
        self.entries(kind).to_vec()
    }

    pub fn entries(&self, kind: CollectionKind) -> &[Arc<Track>] {
        match kind {
            CollectionKind::Liked => &self.liked,
            CollectionKind::Playlist => &self.playlist,
        }
    }

    fn entries_mut(&mut self, kind: CollectionKind) -> &mut Vec<Arc<Track>> {
        match kind {
            CollectionKind::Liked => &mut self.liked,
            CollectionKind::Playlist => &mut self.playlist,
        }
    }
}
