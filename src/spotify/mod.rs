pub mod client;
pub mod models;

pub use client::{SpotifyApi, SpotifyClient};
pub use models::{Artist, CreatePlaylistRequest, Image, Playlist, Track};
