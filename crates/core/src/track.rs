//! Library items as seen by the sweep.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::id::ItemId;

/// Typed access to the descriptive fields of a track.
///
/// These are the fields a lyrics lookup depends on; a change to any of them
/// means earlier "no result" history no longer applies.
pub trait TrackMetadata {
    fn name(&self) -> Option<&str>;
    fn path(&self) -> Option<&str>;
    fn duration(&self) -> Option<Duration>;
    fn album(&self) -> Option<&str>;
    fn artists(&self) -> &[String];
    fn album_artists(&self) -> &[String];
}

/// An audio track from the host library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioTrack {
    pub id: ItemId,
    pub name: Option<String>,
    pub path: Option<String>,
    pub duration: Option<Duration>,
    pub album: Option<String>,
    #[serde(default)]
    pub artists: Vec<String>,
    #[serde(default)]
    pub album_artists: Vec<String>,
}

impl AudioTrack {
    pub fn new(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            path: None,
            duration: None,
            album: None,
            artists: Vec::new(),
            album_artists: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    pub fn with_artists<I, S>(mut self, artists: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.artists = artists.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_album_artists<I, S>(mut self, artists: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.album_artists = artists.into_iter().map(Into::into).collect();
        self
    }

    /// Path if known, otherwise the id. Used for log records.
    pub fn display_path(&self) -> &str {
        self.path.as_deref().unwrap_or(self.id.as_str())
    }
}

impl TrackMetadata for AudioTrack {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn album(&self) -> Option<&str> {
        self.album.as_deref()
    }

    fn artists(&self) -> &[String] {
        &self.artists
    }

    fn album_artists(&self) -> &[String] {
        &self.album_artists
    }
}

/// One entry of a library page.
///
/// The library query asks for audio only, but hosts may still hand back
/// other item kinds (folders, playlists); those are skipped by the sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LibraryItem {
    Audio(AudioTrack),
    Other { id: ItemId, kind: String },
}

impl LibraryItem {
    pub fn id(&self) -> &ItemId {
        match self {
            LibraryItem::Audio(track) => &track.id,
            LibraryItem::Other { id, .. } => id,
        }
    }

    pub fn as_audio(&self) -> Option<&AudioTrack> {
        match self {
            LibraryItem::Audio(track) => Some(track),
            LibraryItem::Other { .. } => None,
        }
    }
}

impl From<AudioTrack> for LibraryItem {
    fn from(track: AudioTrack) -> Self {
        LibraryItem::Audio(track)
    }
}
