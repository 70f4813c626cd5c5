//! The ordered player selection published by the selection daemon.

use serde::{Deserialize, Serialize};

use crate::player::PlayerId;

/// An ordered list of player ids, most-relevant first.
///
/// The ordering is owned by the selection daemon; playwatch only ever looks
/// at the head.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection(pub Vec<PlayerId>);

impl Selection {
    pub fn new(ids: Vec<PlayerId>) -> Self {
        Self(ids)
    }

    /// The player currently considered active, if any.
    pub fn head(&self) -> Option<&PlayerId> {
        self.0.first()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<PlayerId> for Selection {
    fn from_iter<T: IntoIterator<Item = PlayerId>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One change to the selection.
///
/// A notification that carries the new list inline becomes `Replaced`; a
/// notification that drops the list without a value becomes `Cleared`, which
/// reads the same as an empty replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionEvent {
    Replaced(Selection),
    Cleared,
}

impl SelectionEvent {
    /// The selection in force after this event.
    pub fn into_selection(self) -> Selection {
        match self {
            Self::Replaced(selection) => selection,
            Self::Cleared => Selection::default(),
        }
    }
}
