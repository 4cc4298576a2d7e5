//! Session controller for searching the Spotify catalog, collecting tracks and
//! playing them through a device registered with an external playback engine.
//!
//! The [`SessionController`] is the entry point. It owns every piece of session
//! state and sequences the asynchronous pieces around it:
//!
//! - [`auth::CredentialManager`] acquires the client-credentials token
//! - [`model::CatalogClient`] runs paginated track searches
//! - [`registrar::DeviceRegistrar`] boots the engine and sends play commands
//! - [`model::Collections`] keeps the liked and playlist collections

pub mod auth;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod logging;
pub mod model;
pub mod registrar;

pub use config::{RefreshPolicy, SearchOrdering, SessionConfig};
pub use controller::SessionController;
pub use engine::{BridgedEngine, EngineBridge, EngineEvent, PlaybackEngine, PlayerState};
pub use error::{SessionError, APOLOGY_MESSAGE};
pub use model::{SessionView, Track, ViewEffect};
pub use registrar::RegistrarState;
