//! Player identity and now-playing snapshot types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fields::StateFields;

/// Unique identifier for a player instance, as published by the selection
/// daemon (e.g. a bus name like `org.mpris.MediaPlayer2.spotify`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Playback position of a player, decoded from its status word.
///
/// Status words other than the two known ones map to `Unknown`; a snapshot
/// assembled from a notification never carries `Unknown` (the engine skips
/// the emission instead), but an initial snapshot may.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Playback {
    Playing,
    Paused,
    Unknown,
}

impl Playback {
    /// Decode a raw status word.
    pub fn from_status(word: &str) -> Self {
        match word {
            "Playing" => Self::Playing,
            "Paused" => Self::Paused,
            _ => Self::Unknown,
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }
}

/// A complete, immutable now-playing snapshot of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Artwork URL, if the player published a usable one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Artist, if the player published a usable one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,

    /// Track title, if the player published a usable one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Decoded playback position
    pub playback: Playback,
}

impl PlayerState {
    /// Assemble a snapshot from a raw metadata bag and a status word.
    ///
    /// Field extraction is uniform: a bag entry contributes a value only if
    /// it holds a non-empty string. Anything else (missing key, empty
    /// string, a list, a number) leaves the field absent.
    pub fn assemble(
        bag: &serde_json::Map<String, Value>,
        status: &str,
        fields: &StateFields,
    ) -> Self {
        Self {
            url: string_field(bag.get(&fields.url_key)),
            artist: string_field(bag.get(&fields.artist_key)),
            title: string_field(bag.get(&fields.title_key)),
            playback: Playback::from_status(status),
        }
    }

    /// Drop the artist when the title already leads with it, as some players
    /// publish "Artist - Title" titles alongside the artist field.
    pub fn without_redundant_artist(mut self) -> Self {
        if let (Some(artist), Some(title)) = (&self.artist, &self.title) {
            if title.starts_with(artist.as_str()) {
                self.artist = None;
            }
        }
        self
    }
}

fn string_field(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// The head of the selection paired with its latest snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePlayer {
    pub id: PlayerId,
    pub state: PlayerState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(entries: &[(&str, Value)]) -> serde_json::Map<String, Value> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn assemble_extracts_all_fields() {
        let bag = bag(&[
            ("mpris:artUrl", json!("file:///art.png")),
            ("xesam:artist", json!("Miles Davis")),
            ("xesam:title", json!("So What")),
        ]);
        let state = PlayerState::assemble(&bag, "Playing", &StateFields::default());
        assert_eq!(state.url.as_deref(), Some("file:///art.png"));
        assert_eq!(state.artist.as_deref(), Some("Miles Davis"));
        assert_eq!(state.title.as_deref(), Some("So What"));
        assert!(state.playback.is_playing());
    }

    #[test]
    fn empty_and_non_string_fields_are_absent() {
        let bag = bag(&[
            ("mpris:artUrl", json!("")),
            ("xesam:artist", json!(["Miles Davis"])),
            ("xesam:title", json!(42)),
        ]);
        let state = PlayerState::assemble(&bag, "Paused", &StateFields::default());
        assert_eq!(state.url, None);
        assert_eq!(state.artist, None);
        assert_eq!(state.title, None);
        assert_eq!(state.playback, Playback::Paused);
    }

    #[test]
    fn missing_keys_leave_fields_absent() {
        let state = PlayerState::assemble(&bag(&[]), "Playing", &StateFields::default());
        assert_eq!(state.url, None);
        assert_eq!(state.artist, None);
        assert_eq!(state.title, None);
    }

    #[test]
    fn unknown_status_words_decode_to_unknown() {
        assert_eq!(Playback::from_status("Stopped"), Playback::Unknown);
        assert_eq!(Playback::from_status(""), Playback::Unknown);
        assert_eq!(Playback::from_status("Paused"), Playback::Paused);
    }

    #[test]
    fn custom_field_names_are_respected() {
        let fields = StateFields {
            title_key: "track:name".into(),
            ..StateFields::default()
        };
        let bag = bag(&[("track:name", json!("Blue in Green"))]);
        let state = PlayerState::assemble(&bag, "Playing", &fields);
        assert_eq!(state.title.as_deref(), Some("Blue in Green"));
    }

    #[test]
    fn redundant_artist_prefix_is_dropped() {
        let state = PlayerState {
            url: None,
            artist: Some("Miles Davis".into()),
            title: Some("Miles Davis - So What".into()),
            playback: Playback::Playing,
        };
        let trimmed = state.without_redundant_artist();
        assert_eq!(trimmed.artist, None);
        assert_eq!(trimmed.title.as_deref(), Some("Miles Davis - So What"));
    }

    #[test]
    fn unrelated_artist_is_kept() {
        let state = PlayerState {
            url: None,
            artist: Some("Miles Davis".into()),
            title: Some("So What".into()),
            playback: Playback::Playing,
        };
        let trimmed = state.clone().without_redundant_artist();
        assert_eq!(trimmed, state);
    }
}
