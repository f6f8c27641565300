use std::sync::Arc;

use tracing::{info, warn};

use crate::config::PLAYLIST_DESCRIPTION;
use crate::error::{AppError, Result};
use crate::mixer::interleave::interleave;
use crate::mixer::selection::MixSelection;
use crate::spotify::{CreatePlaylistRequest, Playlist, SpotifyApi, Track};

/// How a failed source fetch is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchPolicy {
    /// A non-success status from the service counts as an empty track list.
    /// Network and parse failures still abort the mix.
    #[default]
    BestEffort,
    /// Abort the mix with the fetch error.
    Strict,
}

/// How an existing destination playlist is repopulated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteStrategy {
    /// Replace with an empty list, then add the mix. A failure in between
    /// leaves the destination empty.
    #[default]
    ClearThenAdd,
    /// One replace call carrying the whole mix.
    Replace,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MixOptions {
    pub fetch_policy: FetchPolicy,
    pub write_strategy: WriteStrategy,
}

#[derive(Debug, Clone)]
pub struct MixOutcome {
    pub playlist_id: String,
    pub playlist_name: String,
    pub created: bool,
    pub tracks: Vec<Track>,
}

pub struct PlaylistMixer {
    api: Arc<dyn SpotifyApi>,
    options: MixOptions,
}

impl PlaylistMixer {
    pub fn new(api: Arc<dyn SpotifyApi>) -> Self {
        Self::with_options(api, MixOptions::default())
    }

    pub fn with_options(api: Arc<dyn SpotifyApi>, options: MixOptions) -> Self {
        Self { api, options }
    }

    /// Fetches both selected playlists, interleaves them and writes the result
    /// to the playlist called `name`, creating it if needed.
    pub async fn mix(&self, selection: &MixSelection, name: &str) -> Result<MixOutcome> {
        let (first, second) = selection
            .pair()
            .ok_or(AppError::InvalidSelection(selection.len()))?;

        info!("Mixing '{}' and '{}' into '{}'", first.name, second.name, name);

        let (first_tracks, second_tracks) =
            tokio::try_join!(self.fetch_tracks(first), self.fetch_tracks(second))?;

        let mixed = interleave(&first_tracks, &second_tracks);
        info!(
            "Interleaved {} tracks from {} + {} candidates",
            mixed.len(),
            first_tracks.len(),
            second_tracks.len()
        );

        self.write_mix(mixed, name).await
    }

    pub async fn fetch_tracks(&self, playlist: &Playlist) -> Result<Vec<Track>> {
        match self.api.playlist_tracks(&playlist.id).await {
            Ok(tracks) => Ok(tracks),
            Err(e)
                if self.options.fetch_policy == FetchPolicy::BestEffort && e.is_rejection() =>
            {
                warn!("Failed to fetch tracks for {}: {}", playlist.name, e);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn resolve_user_id(&self) -> Result<String> {
        self.api.current_user_id().await?.ok_or(AppError::UserLookup)
    }

    /// Id of the first of the user's playlists whose name equals `name` exactly.
    pub async fn find_existing_destination(&self, name: &str) -> Result<Option<String>> {
        let playlists = self.api.current_user_playlists().await?;
        Ok(playlists.into_iter().find(|p| p.name == name).map(|p| p.id))
    }

    /// Writes `tracks` in order to the destination. Each step gates the next.
    pub async fn write_mix(&self, tracks: Vec<Track>, name: &str) -> Result<MixOutcome> {
        let user_id = self.resolve_user_id().await?;
        let uris: Vec<String> = tracks.iter().filter_map(|t| t.uri.clone()).collect();

        let (playlist_id, created) = match self.find_existing_destination(name).await? {
            Some(playlist_id) => {
                info!("Updating existing playlist: {}", name);
                match self.options.write_strategy {
                    WriteStrategy::ClearThenAdd => {
                        self.api.replace_playlist_tracks(&playlist_id, &[]).await?;
                        self.api.add_playlist_tracks(&playlist_id, &uris).await?;
                    }
                    WriteStrategy::Replace => {
                        self.api.replace_playlist_tracks(&playlist_id, &uris).await?;
                    }
                }
                (playlist_id, false)
            }
            None => {
                let request = CreatePlaylistRequest {
                    name: name.to_string(),
                    description: PLAYLIST_DESCRIPTION.to_string(),
                    public: false,
                };
                let playlist_id = self.api.create_playlist(&user_id, &request).await?;
                self.api.add_playlist_tracks(&playlist_id, &uris).await?;
                (playlist_id, true)
            }
        };

        Ok(MixOutcome {
            playlist_id,
            playlist_name: name.to_string(),
            created,
            tracks,
        })
    }

    /// Starts playback of `playlist_id` on the user's active device.
    pub async fn play(&self, playlist_id: &str) -> Result<()> {
        self.api.start_playback(playlist_id).await
    }
}
