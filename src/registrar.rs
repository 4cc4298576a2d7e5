//! Playback device registration and the play command
//!
//! The registrar walks the engine through its one-time bootstrap:
//!
//! ```text
//! Uninitialized -> ScriptLoading -> PlayerConnecting -> Ready { device_id }
//!                                                        ^          |
//!                                                        |          v
//!                                                   NotReady { device_id }
//! ```
//!
//! Bootstrap runs once per session. A later credential replacement does not
//! restart it; the engine pulls fresh tokens through its [`TokenSource`].

use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::auth::Credential;
use crate::config::SessionConfig;
use crate::engine::{EngineEvent, PlaybackEngine, PlayerOptions, TokenSource};
use crate::error::Result;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RegistrarState {
    #[default]
    Uninitialized,
    ScriptLoading,
    PlayerConnecting,
    Ready { device_id: String },
    NotReady { device_id: String },
}

impl fmt::Display for RegistrarState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => f.write_str("uninitialized"),
            Self::ScriptLoading => f.write_str("loading engine"),
            Self::PlayerConnecting => f.write_str("connecting player"),
            Self::Ready { device_id } => write!(f, "ready ({device_id})"),
            Self::NotReady { device_id } => write!(f, "offline ({device_id})"),
        }
    }
}

pub struct DeviceRegistrar {
    engine: Arc<dyn PlaybackEngine>,
    http: reqwest::Client,
    play_url: String,
    options: PlayerOptions,
    state: Mutex<RegistrarState>,
}

impl DeviceRegistrar {
    pub fn new(engine: Arc<dyn PlaybackEngine>, http: reqwest::Client, config: &SessionConfig) -> Self {
        Self {
            engine,
            http,
            play_url: config.play_url(),
            options: PlayerOptions {
                name: config.device_name.clone(),
                volume: config.volume,
            },
            state: Mutex::new(RegistrarState::Uninitialized),
        }
    }

    pub async fn state(&self) -> RegistrarState {
        self.state.lock().await.clone()
    }

    /// Device id, only while the device is ready to take commands
    pub async fn ready_device(&self) -> Option<String> {
        match &*self.state.lock().await {
            RegistrarState::Ready { device_id } => Some(device_id.clone()),
            _ => None,
        }
    }

    async fn set_state(&self, next: RegistrarState) {
        let mut state = self.state.lock().await;
        tracing::debug!(from = %*state, to = %next, "Registrar transition");
        *state = next;
    }

    /// Load the engine and connect a player.
    ///
    /// Returns the engine's event stream, or `None` if bootstrap already ran
    /// for this session. On failure the registrar stays in the state it
    /// reached, so playback remains unavailable.
    pub async fn bootstrap(&self, tokens: Arc<dyn TokenSource>) -> Result<Option<mpsc::Receiver<EngineEvent>>> {
        {
            let mut state = self.state.lock().await;
            if *state != RegistrarState::Uninitialized {
                tracing::debug!(state = %*state, "Engine bootstrap already started");
                return Ok(None);
            }
            *state = RegistrarState::ScriptLoading;
        }
        tracing::info!("Loading playback engine");

        self.engine.load().await?;
        self.set_state(RegistrarState::PlayerConnecting).await;

        let events = self.engine.connect(self.options.clone(), tokens).await?;
        tracing::info!(name = %self.options.name, "Player connecting");
        Ok(Some(events))
    }

    /// Apply the device lifecycle part of an engine event.
    pub async fn apply(&self, event: &EngineEvent) {
        let mut state = self.state.lock().await;
        match event {
            EngineEvent::Ready { device_id } => {
                if matches!(*state, RegistrarState::Uninitialized | RegistrarState::ScriptLoading) {
                    tracing::warn!(state = %*state, device_id = %device_id, "Ignoring device ready before connect");
                } else {
                    tracing::info!(device_id = %device_id, "Ready with device id");
                    *state = RegistrarState::Ready {
                        device_id: device_id.clone(),
                    };
                }
            }
            EngineEvent::NotReady { device_id } => {
                tracing::warn!(device_id = %device_id, "Device has gone offline");
                if matches!(&*state, RegistrarState::Ready { .. }) {
                    *state = RegistrarState::NotReady {
                        device_id: device_id.clone(),
                    };
                }
            }
            EngineEvent::StateChanged(_) => {}
        }
    }

    /// Start `track_uri` on the registered device.
    ///
    /// Without a ready device or a credential this does nothing. A failed
    /// command is logged and otherwise dropped.
    pub async fn play(&self, credential: Option<&Credential>, track_uri: &str) {
        let Some(device_id) = self.ready_device().await else {
            tracing::debug!(uri = %track_uri, "Play ignored: no ready device");
            return;
        };
        let Some(credential) = credential else {
            tracing::debug!(uri = %track_uri, "Play ignored: no credential");
            return;
        };

        crate::log_api_request!("play", device_id = %device_id, uri = %track_uri);
        let result = self
            .http
            .put(&self.play_url)
            .query(&[("device_id", device_id.as_str())])
            .bearer_auth(&credential.token)
            .json(&serde_json::json!({ "uris": [track_uri] }))
            .send()
            .await
            .and_then(|resp| resp.error_for_status());
        crate::log_api_result!("play", result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BridgedEngine;
    use async_trait::async_trait;
    use chrono::Utc;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct NoToken;

    #[async_trait]
    impl TokenSource for NoToken {
        async fn oauth_token(&self) -> Option<String> {
            None
        }
    }

    fn credential() -> Credential {
        Credential {
            token: "tok".to_string(),
            obtained_at: Utc::now(),
            expires_in: None,
        }
    }

    fn ready(id: &str) -> EngineEvent {
        EngineEvent::Ready {
            device_id: id.to_string(),
        }
    }

    fn registrar(api_base: String) -> (DeviceRegistrar, crate::engine::EngineBridge) {
        let (engine, bridge) = BridgedEngine::new();
        let config = SessionConfig::new("id", "secret").with_endpoints("http://unused/token", api_base);
        (
            DeviceRegistrar::new(Arc::new(engine), reqwest::Client::new(), &config),
            bridge,
        )
    }

    #[tokio::test]
    async fn walks_through_bootstrap_states() {
        let (registrar, bridge) = registrar("http://unused/v1".to_string());
        let registrar = Arc::new(registrar);
        assert_eq!(registrar.state().await, RegistrarState::Uninitialized);

        let task = {
            let registrar = registrar.clone();
            tokio::spawn(async move { registrar.bootstrap(Arc::new(NoToken)).await })
        };
        tokio::task::yield_now().await;
        while registrar.state().await == RegistrarState::Uninitialized {
            tokio::task::yield_now().await;
        }
        assert_eq!(registrar.state().await, RegistrarState::ScriptLoading);

        bridge.script_loaded();
        let events = task.await.unwrap().unwrap();
        assert!(events.is_some());
        assert_eq!(registrar.state().await, RegistrarState::PlayerConnecting);

        // Never re-entered
        assert!(registrar.bootstrap(Arc::new(NoToken)).await.unwrap().is_none());

        registrar.apply(&ready("D1")).await;
        assert_eq!(registrar.ready_device().await.as_deref(), Some("D1"));

        registrar
            .apply(&EngineEvent::NotReady {
                device_id: "D1".to_string(),
            })
            .await;
        assert_eq!(
            registrar.state().await,
            RegistrarState::NotReady {
                device_id: "D1".to_string()
            }
        );
        assert!(registrar.ready_device().await.is_none());

        registrar.apply(&ready("D1")).await;
        assert_eq!(registrar.ready_device().await.as_deref(), Some("D1"));
    }

    #[tokio::test]
    async fn ready_before_connect_is_ignored() {
        let (registrar, _bridge) = registrar("http://unused/v1".to_string());
        registrar.apply(&ready("D1")).await;
        assert_eq!(registrar.state().await, RegistrarState::Uninitialized);
    }

    #[tokio::test]
    async fn play_is_silent_without_ready_device() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        let (registrar, _bridge) = registrar(format!("{}/v1", server.uri()));
        registrar.play(Some(&credential()), "spotify:track:X").await;
    }

    #[tokio::test]
    async fn play_puts_uri_to_ready_device() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/v1/me/player/play"))
            .and(query_param("device_id", "D1"))
            .and(header("authorization", "Bearer tok"))
            .and(body_json(serde_json::json!({ "uris": ["spotify:track:X"] })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let (registrar, bridge) = registrar(format!("{}/v1", server.uri()));
        bridge.script_loaded();
        registrar.bootstrap(Arc::new(NoToken)).await.unwrap();
        registrar.apply(&ready("D1")).await;

        // No credential: still nothing sent
        registrar.play(None, "spotify:track:X").await;
        registrar.play(Some(&credential()), "spotify:track:X").await;
    }

    #[tokio::test]
    async fn failed_play_command_is_swallowed() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let (registrar, bridge) = registrar(format!("{}/v1", server.uri()));
        bridge.script_loaded();
        registrar.bootstrap(Arc::new(NoToken)).await.unwrap();
        registrar.apply(&ready("D1")).await;

        registrar.play(Some(&credential()), "spotify:track:X").await;
        assert_eq!(registrar.ready_device().await.as_deref(), Some("D1"));
    }
}
