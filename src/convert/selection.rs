//! Track selection flags.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which source tracks take part in a conversion, keyed by track index.
///
/// Tracks without an explicit flag take the selection's default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSelection {
    default: bool,
    flags: BTreeMap<usize, bool>,
}

impl TrackSelection {
    /// Every track selected.
    pub fn all() -> Self {
        Self {
            default: true,
            flags: BTreeMap::new(),
        }
    }

    /// No track selected.
    pub fn none() -> Self {
        Self {
            default: false,
            flags: BTreeMap::new(),
        }
    }

    /// Exactly the given tracks selected.
    pub fn only(indices: impl IntoIterator<Item = usize>) -> Self {
        let mut selection = Self::none();
        for index in indices {
            selection.set(index, true);
        }
        selection
    }

    pub fn set(&mut self, index: usize, selected: bool) {
        self.flags.insert(index, selected);
    }

    pub fn toggle(&mut self, index: usize) {
        let selected = self.is_selected(index);
        self.set(index, !selected);
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.flags.get(&index).copied().unwrap_or(self.default)
    }
}

impl Default for TrackSelection {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert!(TrackSelection::all().is_selected(42));
        assert!(!TrackSelection::none().is_selected(0));
    }

    #[test]
    fn test_only_and_toggle() {
        let mut selection = TrackSelection::only([1, 3]);
        assert!(!selection.is_selected(0));
        assert!(selection.is_selected(1));
        assert!(selection.is_selected(3));

        selection.toggle(1);
        selection.toggle(2);
        assert!(!selection.is_selected(1));
        assert!(selection.is_selected(2));
        assert!(selection.is_selected(3));
        assert!(!selection.is_selected(4));
    }
}
