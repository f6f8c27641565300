use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::spotify::models::{
    CreatePlaylistRequest, CreatedPlaylist, PlaybackRequest, Playlist, PlaylistTracksResponse,
    PlaylistsPage, Track, TrackItem, TrackUrisRequest, UserResponse,
};

/// The Web API accepts at most this many URIs per add/replace request.
pub const MAX_URIS_PER_REQUEST: usize = 100;

const PLAYLISTS_PAGE_SIZE: u32 = 50;
const TRACKS_PAGE_SIZE: u32 = 100;
const TRACK_FIELDS: &str = "items(track(id,name,artists(name),uri)),next";

/// Tracks of one page that can be added to a playlist: removed entries and
/// tracks without a URI (local files, unavailable items) are dropped.
fn playable_tracks(items: Vec<TrackItem>) -> Vec<Track> {
    items
        .into_iter()
        .filter_map(|item| item.track)
        .filter(|track| {
            if track.uri.is_none() {
                debug!("Skipping track without URI: {}", track.name);
            }
            track.uri.is_some()
        })
        .collect()
}

/// The Web API endpoints the mixer consumes.
#[async_trait]
pub trait SpotifyApi: Send + Sync {
    /// `Ok(None)` when the profile endpoint answers with a non-success status.
    async fn current_user_id(&self) -> Result<Option<String>>;

    async fn current_user_playlists(&self) -> Result<Vec<Playlist>>;

    /// Tracks of a playlist in order, without tracks that have no playable URI.
    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<Track>>;

    /// Returns the id of the new playlist.
    async fn create_playlist(&self, user_id: &str, request: &CreatePlaylistRequest)
    -> Result<String>;

    /// Sets the playlist's contents to exactly `uris`.
    async fn replace_playlist_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()>;

    /// Appends `uris` in order.
    async fn add_playlist_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()>;

    async fn start_playback(&self, playlist_id: &str) -> Result<()>;
}

pub struct SpotifyClient {
    http_client: Client,
    api_url: String,
    access_token: String,
}

impl SpotifyClient {
    pub fn new(config: &Config, access_token: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_url: config.spotify_api_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path)
    }

    fn tracks_url(&self, playlist_id: &str) -> String {
        self.url(&format!("playlists/{}/tracks", urlencoding::encode(playlist_id)))
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request.bearer_auth(&self.access_token).send().await?;
        if !response.status().is_success() {
            return Err(AppError::from_response(response).await);
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let body = self.send(request).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl SpotifyApi for SpotifyClient {
    async fn current_user_id(&self) -> Result<Option<String>> {
        let response = self
            .http_client
            .get(self.url("me"))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            warn!("Profile lookup failed ({})", response.status());
            return Ok(None);
        }

        let body = response.text().await?;
        let user: UserResponse = serde_json::from_str(&body)?;
        Ok(Some(user.id))
    }

    async fn current_user_playlists(&self) -> Result<Vec<Playlist>> {
        let mut playlists = Vec::new();
        let mut offset = 0;

        loop {
            let page: PlaylistsPage = self
                .get_json(self.http_client.get(self.url("me/playlists")).query(&[
                    ("limit", PLAYLISTS_PAGE_SIZE),
                    ("offset", offset),
                ]))
                .await?;

            playlists.extend(page.items.into_iter().flatten());

            if page.next.is_none() {
                break;
            }
            offset += PLAYLISTS_PAGE_SIZE;
        }

        debug!("Found {} user playlists", playlists.len());
        Ok(playlists)
    }

    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<Track>> {
        let mut tracks = Vec::new();
        let mut offset = 0;

        loop {
            let offset_param = offset.to_string();
            let limit_param = TRACKS_PAGE_SIZE.to_string();
            let page: PlaylistTracksResponse = self
                .get_json(self.http_client.get(self.tracks_url(playlist_id)).query(&[
                    ("fields", TRACK_FIELDS),
                    ("limit", limit_param.as_str()),
                    ("offset", offset_param.as_str()),
                ]))
                .await?;

            tracks.extend(playable_tracks(page.items));

            if page.next.is_none() {
                break;
            }
            offset += TRACKS_PAGE_SIZE;
        }

        info!("Fetched {} tracks from playlist {}", tracks.len(), playlist_id);
        Ok(tracks)
    }

    async fn create_playlist(
        &self,
        user_id: &str,
        request: &CreatePlaylistRequest,
    ) -> Result<String> {
        let url = self.url(&format!("users/{}/playlists", urlencoding::encode(user_id)));
        let created: CreatedPlaylist = self
            .get_json(self.http_client.post(url).json(request))
            .await?;

        info!("Created playlist: {}", request.name);
        Ok(created.id)
    }

    async fn replace_playlist_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        let (head, tail) = uris.split_at(uris.len().min(MAX_URIS_PER_REQUEST));

        self.send(
            self.http_client
                .put(self.tracks_url(playlist_id))
                .json(&TrackUrisRequest { uris: head }),
        )
        .await?;

        if !tail.is_empty() {
            self.add_playlist_tracks(playlist_id, tail).await?;
        }

        debug!("Replaced playlist {} with {} tracks", playlist_id, uris.len());
        Ok(())
    }

    async fn add_playlist_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        for chunk in uris.chunks(MAX_URIS_PER_REQUEST) {
            self.send(
                self.http_client
                    .post(self.tracks_url(playlist_id))
                    .json(&TrackUrisRequest { uris: chunk }),
            )
            .await?;
        }

        info!("Added {} tracks to playlist", uris.len());
        Ok(())
    }

    async fn start_playback(&self, playlist_id: &str) -> Result<()> {
        let request = PlaybackRequest {
            context_uri: format!("spotify:playlist:{}", playlist_id),
            position_ms: 0,
        };

        self.send(
            self.http_client
                .put(self.url("me/player/play"))
                .json(&request),
        )
        .await?;
        Ok(())
    }
}
