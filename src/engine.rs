//! Boundary to the external playback engine
//!
//! The engine streams audio to a device it registers on our behalf. We never
//! drive it directly: it is loaded, handed a token source and player options,
//! and from then on talks back through a channel of [`EngineEvent`]s.
//!
//! [`BridgedEngine`] is the implementation shipped with the crate. It forwards
//! everything through an [`EngineBridge`] handle held by whatever hosts the
//! real engine (a browser page, a test, the console driver).

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch, Mutex};

use crate::error::{Result, SessionError};
use crate::model::Track;

const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Options the engine's player is constructed with
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerOptions {
    pub name: String,
    pub volume: f32,
}

/// Snapshot of the engine's player, as carried by a state change
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerState {
    pub paused: bool,
    pub current_track: Option<Track>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    Ready { device_id: String },
    NotReady { device_id: String },
    /// `None` when the engine reports no player state at all
    StateChanged(Option<PlayerState>),
}

/// Hands the engine a bearer token whenever it asks for one
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn oauth_token(&self) -> Option<String>;
}

#[async_trait]
pub trait PlaybackEngine: Send + Sync {
    /// Resolves once the engine runtime has loaded and is ready to build a player.
    async fn load(&self) -> Result<()>;

    /// Build the player and connect it. Events for its device flow through the
    /// returned receiver until the engine goes away.
    async fn connect(
        &self,
        options: PlayerOptions,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<mpsc::Receiver<EngineEvent>>;
}

#[derive(Default)]
struct BridgeShared {
    tokens: Mutex<Option<Arc<dyn TokenSource>>>,
    options: Mutex<Option<PlayerOptions>>,
}

/// Engine whose lifecycle is driven from the outside through an [`EngineBridge`]
pub struct BridgedEngine {
    loaded: watch::Receiver<bool>,
    events: Mutex<Option<mpsc::Receiver<EngineEvent>>>,
    shared: Arc<BridgeShared>,
}

/// Host-side handle of a [`BridgedEngine`]
#[derive(Clone)]
pub struct EngineBridge {
    loaded: Arc<watch::Sender<bool>>,
    events: mpsc::Sender<EngineEvent>,
    shared: Arc<BridgeShared>,
}

impl BridgedEngine {
    pub fn new() -> (Self, EngineBridge) {
        let (loaded_tx, loaded_rx) = watch::channel(false);
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let shared = Arc::new(BridgeShared::default());

        let engine = Self {
            loaded: loaded_rx,
            events: Mutex::new(Some(events_rx)),
            shared: shared.clone(),
        };
        let bridge = EngineBridge {
            loaded: Arc::new(loaded_tx),
            events: events_tx,
            shared,
        };
        (engine, bridge)
    }
}

#[async_trait]
impl PlaybackEngine for BridgedEngine {
    async fn load(&self) -> Result<()> {
        let mut loaded = self.loaded.clone();
        loaded
            .wait_for(|ready| *ready)
            .await
            .map(|_| ())
            .map_err(|_| SessionError::Engine("engine host went away before loading".to_string()))
    }

    async fn connect(
        &self,
        options: PlayerOptions,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<mpsc::Receiver<EngineEvent>> {
        let events = self
            .events
            .lock()
            .await
            .take()
            .ok_or_else(|| SessionError::Engine("player already connected".to_string()))?;

        tracing::debug!(name = %options.name, volume = options.volume, "Connecting bridged player");
        *self.shared.options.lock().await = Some(options);
        *self.shared.tokens.lock().await = Some(tokens);
        Ok(events)
    }
}

impl EngineBridge {
    /// The engine runtime finished loading (the readiness callback).
    pub fn script_loaded(&self) {
        self.loaded.send_replace(true);
    }

    pub async fn emit(&self, event: EngineEvent) -> Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| SessionError::Engine("no listener for engine events".to_string()))
    }

    /// What the engine gets when it asks for a token. `None` until a player
    /// has connected or while no credential is held.
    pub async fn oauth_token(&self) -> Option<String> {
        let tokens = self.shared.tokens.lock().await.clone();
        match tokens {
            Some(tokens) => tokens.oauth_token().await,
            None => None,
        }
    }

    pub async fn player_options(&self) -> Option<PlayerOptions> {
        self.shared.options.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct FixedToken(&'static str);

    #[async_trait]
    impl TokenSource for FixedToken {
        async fn oauth_token(&self) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    fn options() -> PlayerOptions {
        PlayerOptions {
            name: "Web Playback SDK".to_string(),
            volume: 0.5,
        }
    }

    #[tokio::test]
    async fn load_waits_for_script() {
        let (engine, bridge) = BridgedEngine::new();

        let pending = tokio::time::timeout(Duration::from_millis(20), engine.load()).await;
        assert!(pending.is_err());

        bridge.script_loaded();
        engine.load().await.unwrap();
    }

    #[tokio::test]
    async fn connect_hands_out_events_once() {
        let (engine, bridge) = BridgedEngine::new();
        assert!(bridge.oauth_token().await.is_none());

        let mut events = engine.connect(options(), Arc::new(FixedToken("t1"))).await.unwrap();
        assert!(engine.connect(options(), Arc::new(FixedToken("t2"))).await.is_err());

        assert_eq!(bridge.oauth_token().await.as_deref(), Some("t1"));
        assert_eq!(bridge.player_options().await, Some(options()));

        bridge
            .emit(EngineEvent::Ready {
                device_id: "D1".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(
            events.recv().await,
            Some(EngineEvent::Ready {
                device_id: "D1".to_string()
            })
        );
    }
}
