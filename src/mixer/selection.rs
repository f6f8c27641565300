use crate::spotify::Playlist;

pub const MAX_SELECTED: usize = 2;

/// Up to two playlists picked for mixing, in selection order.
#[derive(Debug, Clone, Default)]
pub struct MixSelection {
    playlists: Vec<Playlist>,
}

impl MixSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deselects `playlist` if selected, otherwise selects it when there is room.
    /// Returns whether the playlist is selected afterwards.
    pub fn toggle(&mut self, playlist: Playlist) -> bool {
        if let Some(pos) = self.playlists.iter().position(|p| p.id == playlist.id) {
            self.playlists.remove(pos);
            return false;
        }
        if self.playlists.len() < MAX_SELECTED {
            self.playlists.push(playlist);
            return true;
        }
        false
    }

    pub fn is_selected(&self, playlist_id: &str) -> bool {
        self.playlists.iter().any(|p| p.id == playlist_id)
    }

    pub fn len(&self) -> usize {
        self.playlists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playlists.is_empty()
    }

    pub fn is_ready(&self) -> bool {
        self.playlists.len() == MAX_SELECTED
    }

    pub fn playlists(&self) -> &[Playlist] {
        &self.playlists
    }

    pub fn pair(&self) -> Option<(&Playlist, &Playlist)> {
        match self.playlists.as_slice() {
            [first, second] => Some((first, second)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spotify::models::{Owner, TrackInfo};

    fn playlist(id: &str) -> Playlist {
        Playlist {
            id: id.to_string(),
            name: format!("Playlist {id}"),
            description: None,
            images: Vec::new(),
            owner: Owner::default(),
            track_info: TrackInfo::default(),
        }
    }

    #[test]
    fn test_third_selection_refused() {
        let mut selection = MixSelection::new();
        assert!(selection.toggle(playlist("a")));
        assert!(selection.toggle(playlist("b")));
        assert!(!selection.toggle(playlist("c")));

        assert!(selection.is_ready());
        assert!(!selection.is_selected("c"));
        let (first, second) = selection.pair().unwrap();
        assert_eq!((first.id.as_str(), second.id.as_str()), ("a", "b"));
    }

    #[test]
    fn test_deselect_makes_room() {
        let mut selection = MixSelection::new();
        selection.toggle(playlist("a"));
        selection.toggle(playlist("b"));
        assert!(!selection.toggle(playlist("a")));
        assert_eq!(selection.len(), 1);
        assert!(selection.pair().is_none());

        assert!(selection.toggle(playlist("c")));
        let ids: Vec<_> = selection.playlists().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }
}
