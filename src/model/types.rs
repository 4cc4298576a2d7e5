//! Core type definitions shared by the session components

use std::sync::Arc;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    #[serde(default)]
    pub images: Vec<Image>,
}

/// A catalog track, kept exactly as the catalog described it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
    #[serde(default)]
    pub album: Album,
}

impl Track {
    /// Artist names joined the way the now playing line shows them
    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn cover_url(&self) -> Option<&str> {
        self.album.images.first().map(|i| i.url.as_str())
    }
}

/// One bounded page of search results
#[derive(Clone, Debug, Default)]
pub struct ResultPage {
    pub query: String,
    pub offset: u32,
    pub items: Vec<Arc<Track>>,
}

/// Where the tracks currently on screen came from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Listing {
    #[default]
    Search,
    Liked,
    Playlist,
}

/// One-shot side effects the view layer is asked to perform
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewEffect {
    ScrollToTop,
}
