//! Session state shared by the controller and read by the view layer

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::SearchOrdering;
use crate::engine::PlayerState;
use crate::error::{Result, APOLOGY_MESSAGE};
use crate::registrar::RegistrarState;
use super::collections::{CollectionKind, Collections};
use super::playback::PlaybackSession;
use super::types::{Listing, ResultPage, Track};

/// Status shown before the first search
pub const PROMPT_MESSAGE: &str = "Search your favorite song";

/// Counts in-flight network calls; loading while any is outstanding
#[derive(Clone, Debug, Default)]
pub struct LoadingTracker {
    in_flight: Arc<AtomicUsize>,
}

/// Marks one call as in flight until dropped
#[must_use = "loading ends as soon as the guard is dropped"]
pub struct LoadingGuard {
    in_flight: Arc<AtomicUsize>,
}

impl LoadingTracker {
    pub fn begin(&self) -> LoadingGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        LoadingGuard {
            in_flight: self.in_flight.clone(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Clone, Debug)]
struct ViewState {
    query: String,
    status_message: String,
    tracks: Vec<Arc<Track>>,
    has_searched_once: bool,
    result_offset: u32,
    listing: Listing,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            query: String::new(),
            status_message: PROMPT_MESSAGE.to_string(),
            tracks: Vec::new(),
            has_searched_once: false,
            result_offset: 0,
            listing: Listing::Search,
        }
    }
}

/// Read model handed to the view layer
#[derive(Clone, Debug)]
pub struct SessionView {
    pub query: String,
    pub status_message: String,
    pub tracks: Vec<Arc<Track>>,
    pub is_loading: bool,
    pub has_searched_once: bool,
    pub current_track: Option<Arc<Track>>,
    pub paused: bool,
    pub result_offset: u32,
    pub listing: Listing,
    pub device_state: RegistrarState,
}

impl SessionView {
    /// The status line, when the view should show one: always before the first
    /// search, afterwards only over an empty result set.
    pub fn display_message(&self) -> Option<&str> {
        if !self.has_searched_once || self.tracks.is_empty() {
            Some(self.status_message.as_str())
        } else {
            None
        }
    }
}

/// All mutable session state
pub struct SessionModel {
    view: Mutex<ViewState>,
    collections: Mutex<Collections>,
    playback: Mutex<PlaybackSession>,
    loading: LoadingTracker,
    search_seq: AtomicU64,
}

impl SessionModel {
    pub fn new() -> Self {
        Self {
            view: Mutex::new(ViewState::default()),
            collections: Mutex::new(Collections::new()),
            playback: Mutex::new(PlaybackSession::default()),
            loading: LoadingTracker::default(),
            search_seq: AtomicU64::new(0),
        }
    }

    pub fn loading(&self) -> &LoadingTracker {
        &self.loading
    }

    pub async fn snapshot(&self, device_state: RegistrarState) -> SessionView {
        let view = self.view.lock().await.clone();
        let playback = self.playback.lock().await.clone();

        SessionView {
            query: view.query,
            status_message: view.status_message,
            tracks: view.tracks,
            is_loading: self.loading.is_loading(),
            has_searched_once: view.has_searched_once,
            current_track: playback.current_track,
            paused: playback.paused,
            result_offset: view.result_offset,
            listing: view.listing,
            device_state,
        }
    }

    // ========================================================================
    // Query & Search Results
    // ========================================================================

    pub async fn set_query(&self, query: String) {
        self.view.lock().await.query = query;
    }

    pub async fn query(&self) -> String {
        self.view.lock().await.query.clone()
    }

    pub async fn result_offset(&self) -> u32 {
        self.view.lock().await.result_offset
    }

    pub async fn set_status(&self, message: &str) {
        self.view.lock().await.status_message = message.to_string();
    }

    /// Put the prompt back after a recovered failure. Other messages stay.
    pub async fn clear_apology(&self) {
        let mut view = self.view.lock().await;
        if view.status_message == APOLOGY_MESSAGE {
            view.status_message = PROMPT_MESSAGE.to_string();
        }
    }

    /// Clear the screen for a new search and hand out its sequence number.
    pub async fn begin_search(&self, offset: u32) -> u64 {
        let seq = self.search_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let mut view = self.view.lock().await;
        view.tracks.clear();
        view.status_message.clear();
        view.result_offset = offset;
        view.listing = Listing::Search;
        seq
    }

    /// Apply the outcome of search `seq`. Returns false if it was discarded
    /// as stale under [`SearchOrdering::LatestIssued`].
    pub async fn finish_search(&self, seq: u64, ordering: SearchOrdering, outcome: Result<ResultPage>) -> bool {
        let mut view = self.view.lock().await;

        if ordering == SearchOrdering::LatestIssued && seq != self.search_seq.load(Ordering::SeqCst) {
            tracing::debug!(seq, "Discarding superseded search response");
            return false;
        }

        match outcome {
            Ok(page) => {
                tracing::debug!(seq, query = %page.query, count = page.items.len(), "Applying search results");
                view.tracks = page.items;
                view.result_offset = page.offset;
                view.listing = Listing::Search;
                view.has_searched_once = true;
            }
            Err(_) => {
                view.status_message = APOLOGY_MESSAGE.to_string();
            }
        }
        true
    }

    // ========================================================================
    // Collections
    // ========================================================================

    pub async fn add_to_collection(&self, kind: CollectionKind, track_id: &str) -> bool {
        let view = self.view.lock().await;
        let mut collections = self.collections.lock().await;
        collections.add_from(kind, track_id, &view.tracks)
    }

    pub async fn show_collection(&self, kind: CollectionKind) {
        let mut view = self.view.lock().await;
        let collections = self.collections.lock().await;
        view.tracks = collections.snapshot(kind);
        view.listing = kind.listing();
        view.has_searched_once = true;
    }

    pub async fn collection(&self, kind: CollectionKind) -> Vec<Arc<Track>> {
        self.collections.lock().await.snapshot(kind)
    }

    // ========================================================================
    // Playback
    // ========================================================================

    pub async fn register_device(&self, device_id: String) {
        self.playback.lock().await.register_device(device_id);
    }

    pub async fn apply_player_state(&self, state: Option<PlayerState>) {
        self.playback.lock().await.apply_state(state);
    }

    pub async fn playback(&self) -> PlaybackSession {
        self.playback.lock().await.clone()
    }
}

impl Default for SessionModel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;
    use crate::model::Album;

    fn page(query: &str, ids: &[&str]) -> ResultPage {
        ResultPage {
            query: query.to_string(),
            offset: 0,
            items: ids
                .iter()
                .map(|id| {
                    Arc::new(Track {
                        id: id.to_string(),
                        uri: format!("spotify:track:{id}"),
                        name: id.to_string(),
                        artists: vec![],
                        album: Album::default(),
                    })
                })
                .collect(),
        }
    }

    fn ids(view: &SessionView) -> Vec<String> {
        view.tracks.iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn loading_guard_releases_on_drop() {
        let tracker = LoadingTracker::default();
        assert!(!tracker.is_loading());

        let first = tracker.begin();
        let second = tracker.begin();
        drop(first);
        assert!(tracker.is_loading());
        drop(second);
        assert!(!tracker.is_loading());
    }

    #[tokio::test]
    async fn prompt_shown_until_first_search() {
        let model = SessionModel::new();
        let view = model.snapshot(RegistrarState::Uninitialized).await;
        assert_eq!(view.display_message(), Some(PROMPT_MESSAGE));

        let seq = model.begin_search(0).await;
        model.finish_search(seq, SearchOrdering::LastArrival, Ok(page("a", &["1"]))).await;

        let view = model.snapshot(RegistrarState::Uninitialized).await;
        assert!(view.has_searched_once);
        assert_eq!(view.display_message(), None);
    }

    #[tokio::test]
    async fn failed_search_leaves_apology_and_no_tracks() {
        let model = SessionModel::new();
        let seq = model.begin_search(0).await;
        model
            .finish_search(
                seq,
                SearchOrdering::LastArrival,
                Err(SessionError::Search {
                    status_text: "Bad Gateway".to_string(),
                }),
            )
            .await;

        let view = model.snapshot(RegistrarState::Uninitialized).await;
        assert!(view.tracks.is_empty());
        assert_eq!(view.display_message(), Some(APOLOGY_MESSAGE));
    }

    #[tokio::test]
    async fn clear_apology_restores_prompt_only() {
        let model = SessionModel::new();
        model.set_status(APOLOGY_MESSAGE).await;
        model.clear_apology().await;
        let view = model.snapshot(RegistrarState::Uninitialized).await;
        assert_eq!(view.status_message, PROMPT_MESSAGE);

        model.set_status("").await;
        model.clear_apology().await;
        let view = model.snapshot(RegistrarState::Uninitialized).await;
        assert_eq!(view.status_message, "");
    }

    #[tokio::test]
    async fn latest_issued_drops_superseded_responses() {
        let model = SessionModel::new();
        let first = model.begin_search(0).await;
        let second = model.begin_search(0).await;

        assert!(model.finish_search(second, SearchOrdering::LatestIssued, Ok(page("b", &["b1"]))).await);
        assert!(!model.finish_search(first, SearchOrdering::LatestIssued, Ok(page("a", &["a1"]))).await);

        let view = model.snapshot(RegistrarState::Uninitialized).await;
        assert_eq!(ids(&view), ["b1"]);
    }

    #[tokio::test]
    async fn collection_view_replaces_tracks_only() {
        let model = SessionModel::new();
        let seq = model.begin_search(0).await;
        model
            .finish_search(seq, SearchOrdering::LastArrival, Ok(page("a", &["x", "y"])))
            .await;

        assert!(model.add_to_collection(CollectionKind::Liked, "x").await);
        assert!(model.add_to_collection(CollectionKind::Playlist, "y").await);

        model.show_collection(CollectionKind::Liked).await;
        let view = model.snapshot(RegistrarState::Uninitialized).await;
        assert_eq!(ids(&view), ["x"]);
        assert_eq!(view.listing, Listing::Liked);

        // Only the liked entry is on screen now, so "y" cannot be liked from here.
        assert!(!model.add_to_collection(CollectionKind::Liked, "y").await);
    }
}
