//! Wire vocabulary for property notifications.
//!
//! The engine never hard-codes the names it matches notifications against.
//! These structs carry the interface scope, the tracked property names, and
//! the metadata-bag keys, with MPRIS defaults.

use serde::{Deserialize, Serialize};

/// Names used when tracking a player's now-playing state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateFields {
    /// Interface scope a notification must carry to be considered
    #[serde(default = "default_state_interface")]
    pub interface: String,

    /// Property holding the metadata bag
    #[serde(default = "default_metadata")]
    pub metadata: String,

    /// Property holding the playback status word
    #[serde(default = "default_playback")]
    pub playback: String,

    /// Bag key for the artwork URL
    #[serde(default = "default_url_key")]
    pub url_key: String,

    /// Bag key for the artist entry
    #[serde(default = "default_artist_key")]
    pub artist_key: String,

    /// Bag key for the track title
    #[serde(default = "default_title_key")]
    pub title_key: String,
}

impl Default for StateFields {
    fn default() -> Self {
        Self {
            interface: default_state_interface(),
            metadata: default_metadata(),
            playback: default_playback(),
            url_key: default_url_key(),
            artist_key: default_artist_key(),
            title_key: default_title_key(),
        }
    }
}

fn default_state_interface() -> String {
    "org.mpris.MediaPlayer2.Player".into()
}
fn default_metadata() -> String {
    "Metadata".into()
}
fn default_playback() -> String {
    "PlaybackStatus".into()
}
fn default_url_key() -> String {
    "mpris:artUrl".into()
}
fn default_artist_key() -> String {
    "xesam:artist".into()
}
fn default_title_key() -> String {
    "xesam:title".into()
}

/// Names used when tracking the suppression switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagFields {
    /// Interface scope a notification must carry to be considered
    #[serde(default = "default_flag_interface")]
    pub interface: String,

    /// Property holding the boolean flag
    #[serde(default = "default_flag_property")]
    pub property: String,
}

impl Default for FlagFields {
    fn default() -> Self {
        Self {
            interface: default_flag_interface(),
            property: default_flag_property(),
        }
    }
}

fn default_flag_interface() -> String {
    "com.github.nitin100.playwatch".into()
}
fn default_flag_property() -> String {
    "Suppressed".into()
}
