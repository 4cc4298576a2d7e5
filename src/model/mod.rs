//! Model module - Session state and data types
//!
//! This module contains the data structures and state management for a session.
//! It is organized into submodules by responsibility:
//!
//! - `types`: Catalog types (tracks, result pages) and view enums
//! - `playback`: Device registration and now playing state
//! - `collections`: Liked and playlist collections
//! - `catalog`: Catalog search client
//! - `session`: Shared session state and the read model for the view layer

mod types;
mod playback;
mod collections;
mod catalog;
mod session;

pub use types::{Album, Artist, Image, Listing, ResultPage, Track, ViewEffect};

pub use playback::PlaybackSession;

pub use collections::{CollectionKind, Collections};

pub use catalog::{CatalogClient, PAGE_SIZE};

pub use session::{LoadingGuard, LoadingTracker, SessionModel, SessionView, PROMPT_MESSAGE};
