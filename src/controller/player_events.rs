//! Player event listener for playback engine events

use tokio::sync::mpsc;

use crate::engine::EngineEvent;
use super::SessionController;

impl SessionController {
    pub(crate) fn start_player_event_listener(&self, mut events: mpsc::Receiver<EngineEvent>) {
        let model = self.model.clone();
        let registrar = self.registrar.clone();
        tracing::info!("Starting playback engine event listener");

        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                registrar.apply(&event).await;

                match event {
                    EngineEvent::Ready { device_id } => {
                        model.register_device(device_id).await;
                    }
                    EngineEvent::NotReady { .. } => {}
                    EngineEvent::StateChanged(state) => {
                        match state.as_ref().and_then(|s| s.current_track.as_ref()) {
                            Some(track) => tracing::info!(
                                track = %track.name,
                                artist = %track.artist_names(),
                                uri = %track.uri,
                                "EngineEvent::StateChanged"
                            ),
                            None => tracing::debug!("EngineEvent::StateChanged without active track"),
                        }
                        model.apply_player_state(state).await;
                    }
                }
            }
            tracing::debug!("Playback engine event listener shutting down");
        });
    }
}
