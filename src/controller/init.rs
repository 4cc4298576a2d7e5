//! Startup sequencing: credential first, then the playback engine

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::engine::TokenSource;
use crate::error::APOLOGY_MESSAGE;
use super::SessionController;

impl SessionController {
    /// Acquire the session credential and, once it is held, start the engine
    /// bootstrap in the background. Only the first call does anything.
    pub async fn initialize(&self) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            tracing::debug!("Session already initialized");
            return;
        }
        tracing::info!("Initializing session");
        self.acquire_credential().await;
    }

    /// Retry credential acquisition by hand, e.g. after a failed startup.
    pub async fn retry_credential(&self) {
        self.acquire_credential().await;
    }

    async fn acquire_credential(&self) {
        let result = {
            let _loading = self.model.loading().begin();
            self.credentials.acquire().await
        };

        match result {
            Ok(_) => {
                self.model.clear_apology().await;
                let controller = self.clone();
                tokio::spawn(async move {
                    controller.bootstrap_playback().await;
                });
            }
            Err(e) => {
                tracing::error!(error = %e, "Error fetching token");
                self.model.set_status(APOLOGY_MESSAGE).await;
            }
        }
    }

    async fn bootstrap_playback(&self) {
        let tokens: Arc<dyn TokenSource> = self.credentials.clone();
        match self.registrar.bootstrap(tokens).await {
            Ok(Some(events)) => self.start_player_event_listener(events),
            Ok(None) => {}
            Err(e) => tracing::error!(error = %e, "Playback engine bootstrap failed"),
        }
    }
}
