//! Playback control

use super::SessionController;

impl SessionController {
    /// Play `track_uri` on the registered device. Does nothing until both a
    /// credential and a ready device exist.
    pub async fn play(&self, track_uri: &str) {
        tracing::debug!(uri = %track_uri, "Play requested");
        self.ensure_fresh_credential().await;
        let credential = self.credentials.current().await;
        self.registrar.play(credential.as_ref(), track_uri).await;
    }

    pub async fn device_id(&self) -> Option<String> {
        self.model.playback().await.device_id
    }
}
