pub mod auth;
pub mod config;
pub mod error;
pub mod mixer;
pub mod spotify;

pub use auth::{TokenManager, TokenState};
pub use config::Config;
pub use error::{AppError, Result};
pub use mixer::{MixOptions, MixSelection, PlaylistMixer};
pub use spotify::{Playlist, SpotifyApi, SpotifyClient, Track};
