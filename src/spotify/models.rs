use serde::{Deserialize, Deserializer, Serialize};

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Owner {
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackInfo {
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<Image>,
    #[serde(default)]
    pub owner: Owner,
    #[serde(rename = "tracks", default)]
    pub track_info: TrackInfo,
}

impl Playlist {
    pub fn owner_name(&self) -> &str {
        self.owner.display_name.as_deref().unwrap_or("unknown")
    }

    pub fn total_tracks(&self) -> u32 {
        self.track_info.total
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: Option<String>,
    pub name: String,
    pub uri: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub artists: Vec<Artist>,
}

impl Track {
    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrackItem {
    pub track: Option<Track>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlaylistTracksResponse {
    #[serde(default)]
    pub items: Vec<TrackItem>,
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlaylistsPage {
    #[serde(default)]
    pub items: Vec<Option<Playlist>>,
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserResponse {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedPlaylist {
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: String,
    pub public: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct TrackUrisRequest<'a> {
    pub uris: &'a [String],
}

#[derive(Debug, Serialize)]
pub(crate) struct PlaybackRequest {
    pub context_uri: String,
    pub position_ms: u64,
}

#[cfg(test)]
impl Track {
    pub fn mock(name: &str) -> Self {
        Self {
            id: Some(format!("{name}_id")),
            name: name.to_string(),
            uri: Some(format!("spotify:track:{name}")),
            artists: vec![Artist {
                name: "Mock Artist".to_string(),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playlist_with_null_fields() {
        let json = r#"{
            "id": "p1",
            "name": "Road Trip",
            "description": null,
            "images": null,
            "owner": {"display_name": null, "id": "u1"},
            "tracks": {"href": "x", "total": 12}
        }"#;
        let playlist: Playlist = serde_json::from_str(json).unwrap();
        assert_eq!(playlist.description, None);
        assert!(playlist.images.is_empty());
        assert_eq!(playlist.owner_name(), "unknown");
        assert_eq!(playlist.total_tracks(), 12);
    }

    #[test]
    fn test_track_items_with_local_and_missing_tracks() {
        let json = r#"{"items": [
            {"track": {"id": "1", "name": "A", "uri": "spotify:track:1", "artists": [{"name": "X"}, {"name": "Y"}]}},
            {"track": {"id": null, "name": "Local", "uri": null, "artists": []}},
            {"track": null}
        ], "next": null}"#;
        let response: PlaylistTracksResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.items.len(), 3);
        let first = response.items[0].track.as_ref().unwrap();
        assert_eq!(first.artist_names(), "X, Y");
        assert_eq!(response.items[1].track.as_ref().unwrap().uri, None);
        assert!(response.items[2].track.is_none());
    }
}
