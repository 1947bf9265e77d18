use map_common::MapDocument;

/// Tags the user has clicked, in click order.
///
/// Behaves as a set: a tag appears at most once and equality ignores order.
/// Toggling returns a new state so earlier states stay valid for comparison.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    tags: Vec<String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `tag` if absent, remove it if present.
    ///
    /// Unknown tags are accepted; they simply match no map.
    #[must_use]
    pub fn toggle(&self, tag: &str) -> Self {
        let mut tags = self.tags.clone();
        match tags.iter().position(|t| t == tag) {
            Some(pos) => {
                tags.remove(pos);
            }
            None => tags.push(tag.to_string()),
        }
        Self { tags }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.tags.iter().map(String::as_str)
    }

    /// Conjunctive match: the map carries every selected tag.
    pub fn matches(&self, map: &MapDocument) -> bool {
        self.tags.iter().all(|tag| map.has_tag(tag))
    }

    /// Comma-joined tags in click order, as echoed into the search box.
    pub fn to_text(&self) -> String {
        self.tags.join(",")
    }
}

impl PartialEq for SelectionState {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.tags.iter().all(|t| other.contains(t))
    }
}

impl Eq for SelectionState {}

impl<S: Into<String>> FromIterator<S> for SelectionState {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        iter.into_iter()
            .map(Into::into)
            .fold(Self::new(), |state, tag: String| {
                if state.contains(&tag) {
                    state
                } else {
                    state.toggle(&tag)
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_adds_then_removes() {
        let empty = SelectionState::new();

        let forest = empty.toggle("forest");
        assert!(forest.contains("forest"));
        assert!(empty.is_empty());

        let back = forest.toggle("forest");
        assert!(back.is_empty());
        assert_eq!(back, empty);
    }

    #[test]
    fn toggle_leaves_original_untouched() {
        let original: SelectionState = ["forest", "night"].into_iter().collect();

        let toggled = original.toggle("night");

        assert_eq!(original.len(), 2);
        assert_eq!(toggled.len(), 1);
        assert_ne!(original, toggled);
    }

    #[test]
    fn equality_is_set_equality() {
        let a: SelectionState = ["forest", "night"].into_iter().collect();
        let b: SelectionState = ["night", "forest"].into_iter().collect();

        assert_eq!(a, b);
    }

    #[test]
    fn collecting_ignores_repeats() {
        let selection: SelectionState = ["forest", "forest"].into_iter().collect();

        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn matches_requires_every_tag() {
        let map = MapDocument::new("A", ["forest", "night"]);

        assert!(SelectionState::new().matches(&map));
        assert!(SelectionState::new().toggle("forest").matches(&map));
        assert!(!SelectionState::new().toggle("forest").toggle("desert").matches(&map));
    }

    #[test]
    fn text_keeps_click_order() {
        let selection = SelectionState::new().toggle("night").toggle("forest");

        assert_eq!(selection.to_text(), "night,forest");
    }
}
