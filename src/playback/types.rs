//! Control-plane API payloads and the now-playing display value

use serde::{Deserialize, Serialize};
use std::fmt;

/// Shown when a track has no release date
pub const UNKNOWN_YEAR: &str = "Unknown Year";

/// `GET /me/player`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaybackState {
    /// Whether something is playing right now
    #[serde(default)]
    pub is_playing: bool,

    /// Current shuffle flag
    #[serde(default)]
    pub shuffle_state: bool,

    /// The active device, if any
    #[serde(default)]
    pub device: Option<Device>,
}

/// `GET /me/player/currently-playing`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentlyPlaying {
    /// The playing item; `None` during ads or between items
    #[serde(default)]
    pub item: Option<Track>,

    /// Whether playback is running
    #[serde(default)]
    pub is_playing: bool,
}

/// A playable item as returned by the API
///
/// Episodes deserialize too; they simply have no artists or album.
#[derive(Debug, Clone, Deserialize)]
pub struct Track {
    /// Track id; `None` for local files
    #[serde(default)]
    pub id: Option<String>,

    /// Track title
    pub name: String,

    /// Performing artists, in credited order
    #[serde(default)]
    pub artists: Vec<Artist>,

    /// Album the track was released on
    #[serde(default)]
    pub album: Option<Album>,
}

/// Artist reference inside a track
#[derive(Debug, Clone, Deserialize)]
pub struct Artist {
    /// Display name
    pub name: String,
}

/// Album reference inside a track
#[derive(Debug, Clone, Deserialize)]
pub struct Album {
    /// `YYYY`, `YYYY-MM` or `YYYY-MM-DD`
    #[serde(default)]
    pub release_date: Option<String>,
}

/// A Connect device
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Device {
    /// Device id; absent for restricted devices
    #[serde(default)]
    pub id: Option<String>,

    /// User-visible device name
    pub name: String,

    /// Whether this device is the current playback target
    #[serde(default)]
    pub is_active: bool,

    /// Device kind (`Computer`, `Smartphone`, `Speaker`, ...)
    #[serde(rename = "type", default)]
    pub device_type: String,

    /// Current volume, when the device reports one
    #[serde(default)]
    pub volume_percent: Option<u32>,
}

/// `GET /me/player/devices`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DevicesResponse {
    /// Available devices
    #[serde(default)]
    pub devices: Vec<Device>,
}

/// What the remote displays for the current track
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NowPlaying {
    /// Track id, empty for local files
    pub track_id: String,
    /// Track title
    pub name: String,
    /// Release year, or [`UNKNOWN_YEAR`]
    pub year: String,
    /// Artist names joined with `", "`
    pub artists: String,
}

impl NowPlaying {
    /// Builds the display value from a track
    ///
    /// # Examples
    ///
    /// ```
    /// use spotremote::playback::types::{NowPlaying, Track};
    ///
    /// let track: Track = serde_json::from_value(serde_json::json!({
    ///     "id": "t1",
    ///     "name": "Song",
    ///     "artists": [{"name": "A"}, {"name": "B"}],
    ///     "album": {"release_date": "1999-03-01"}
    /// })).unwrap();
    ///
    /// assert_eq!(NowPlaying::from_track(&track).to_string(), "1999 - A, B - Song");
    /// ```
    pub fn from_track(track: &Track) -> Self {
        let year = track
            .album
            .as_ref()
            .and_then(|a| a.release_date.as_deref())
            .and_then(|d| d.split('-').next())
            .filter(|y| !y.is_empty())
            .unwrap_or(UNKNOWN_YEAR)
            .to_string();

        let artists = track
            .artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            track_id: track.id.clone().unwrap_or_default(),
            name: track.name.clone(),
            year,
            artists,
        }
    }
}

impl fmt::Display for NowPlaying {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} - {}", self.year, self.artists, self.name)
    }
}
