//! Controller module - Session orchestration
//!
//! This module contains the session controller that the view layer drives.
//! It owns the session state and sequences credential acquisition, catalog
//! searches, device registration and engine events. It is organized into
//! submodules by responsibility:
//!
//! - `init`: Credential acquisition and engine bootstrap
//! - `search`: Query, search and pagination actions
//! - `collections`: Like, add-to-playlist and collection views
//! - `playback`: The play action
//! - `player_events`: Playback engine event listener

mod init;
mod search;
mod collections;
mod playback;
mod player_events;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::auth::CredentialManager;
use crate::config::SessionConfig;
use crate::engine::PlaybackEngine;
use crate::error::Result;
use crate::model::{CatalogClient, SessionModel, SessionView, ViewEffect};
use crate::registrar::{DeviceRegistrar, RegistrarState};

const EFFECT_CHANNEL_CAPACITY: usize = 16;

#[derive(Clone)]
pub struct SessionController {
    pub(crate) config: Arc<SessionConfig>,
    pub(crate) model: Arc<SessionModel>,
    pub(crate) credentials: Arc<CredentialManager>,
    pub(crate) catalog: Arc<CatalogClient>,
    pub(crate) registrar: Arc<DeviceRegistrar>,
    effects: broadcast::Sender<ViewEffect>,
    initialized: Arc<AtomicBool>,
}

impl SessionController {
    pub fn new(config: SessionConfig, engine: Arc<dyn PlaybackEngine>) -> Result<Self> {
        let http = config.http_client()?;
        let (effects, _) = broadcast::channel(EFFECT_CHANNEL_CAPACITY);

        Ok(Self {
            credentials: Arc::new(CredentialManager::new(http.clone(), &config)),
            catalog: Arc::new(CatalogClient::new(http.clone(), &config)),
            registrar: Arc::new(DeviceRegistrar::new(engine, http, &config)),
            model: Arc::new(SessionModel::new()),
            config: Arc::new(config),
            effects,
            initialized: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Current read model for the view layer
    pub async fn view(&self) -> SessionView {
        let device_state = self.registrar.state().await;
        self.model.snapshot(device_state).await
    }

    pub fn subscribe_effects(&self) -> broadcast::Receiver<ViewEffect> {
        self.effects.subscribe()
    }

    pub async fn device_state(&self) -> RegistrarState {
        self.registrar.state().await
    }

    pub(crate) fn emit(&self, effect: ViewEffect) {
        // Nobody listening is fine: the effect is advisory
        let _ = self.effects.send(effect);
    }

    /// Swap in a fresh credential if the refresh policy asks for one.
    pub(crate) async fn ensure_fresh_credential(&self) {
        if let Err(e) = self.credentials.refresh_if_needed().await {
            tracing::warn!(error = %e, "Credential refresh failed, keeping current credential");
        }
    }
}
