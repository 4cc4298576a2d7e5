//! Playback-related state

use std::sync::Arc;

use crate::engine::PlayerState;
use super::types::Track;

/// Device registration and now playing state for the session
#[derive(Clone, Debug, Default)]
pub struct PlaybackSession {
    pub device_id: Option<String>,
    pub current_track: Option<Arc<Track>>,
    pub paused: bool,
}

impl PlaybackSession {
    pub fn register_device(&mut self, device_id: String) {
        if self.device_id.as_deref() != Some(device_id.as_str()) {
            tracing::info!(device_id = %device_id, "Playback device registered");
        }
        self.device_id = Some(device_id);
    }

    /// Replace the now playing track wholesale. A notification without a
    /// player state or without an active track clears it.
    pub fn apply_state(&mut self, state: Option<PlayerState>) {
        match state {
            Some(PlayerState { paused, current_track }) => {
                self.paused = paused;
                self.current_track = current_track.map(Arc::new);
            }
            None => {
                self.paused = true;
                self.current_track = None;
            }
        }
    }
}
