//! Visible-set derivation.
//!
//! Both entry points are pure: the same collection and selection always
//! produce the same [`VisibleState`], so callers may cache on those inputs.

use map_common::MapCollection;

use crate::selection::SelectionState;
use crate::tag_index::{build_tag_index, TagIndex};

/// Maps and tag index currently on screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibleState {
    pub maps: MapCollection,
    pub tag_index: TagIndex,
}

impl VisibleState {
    /// The unfiltered view of a freshly loaded collection.
    pub fn identity(collection: &MapCollection, index: &TagIndex) -> Self {
        Self {
            maps: collection.clone(),
            tag_index: index.clone(),
        }
    }
}

/// Recompute the visible maps and tag index for `selection`.
///
/// An empty selection is the identity case. Otherwise the maps carrying
/// every selected tag are kept in collection order and the tag index is
/// rebuilt from just those maps, so it never lists a tag with no visible map.
pub fn recompute(collection: &MapCollection, selection: &SelectionState) -> VisibleState {
    if selection.is_empty() {
        return VisibleState {
            maps: collection.clone(),
            tag_index: build_tag_index(collection),
        };
    }

    filter(collection, selection)
}

/// Same as [`recompute`], reusing an index already built for `collection`
/// in the identity case.
pub fn recompute_with_index(
    collection: &MapCollection,
    index: &TagIndex,
    selection: &SelectionState,
) -> VisibleState {
    if selection.is_empty() {
        return VisibleState::identity(collection, index);
    }

    filter(collection, selection)
}

fn filter(collection: &MapCollection, selection: &SelectionState) -> VisibleState {
    let maps = collection.retain_matching(|map| selection.matches(map));
    let tag_index = build_tag_index(&maps);

    tracing::debug!(
        selected = selection.len(),
        visible_maps = maps.len(),
        visible_tags = tag_index.len(),
        "recomputed visible state"
    );

    VisibleState { maps, tag_index }
}
