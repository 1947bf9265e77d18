//! Tag → map id index.
//!
//! Built from scratch for every collection (and for every filtered view of
//! one); there is no incremental maintenance. Tags keep the order in which
//! they were first seen so the view can list them stably.

use map_common::{MapCollection, MapDocument, MapId};
use std::collections::HashMap;

/// One tag and the maps carrying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEntry {
    pub tag: String,
    pub map_ids: Vec<MapId>,
}

impl TagEntry {
    pub fn match_count(&self) -> usize {
        self.map_ids.len()
    }
}

/// Mapping from feature tag to the ids of maps that list it.
///
/// Every key maps to at least one id.
#[derive(Debug, Clone, Default)]
pub struct TagIndex {
    entries: Vec<TagEntry>,
    positions: HashMap<String, usize>,
}

impl TagIndex {
    pub fn get(&self, tag: &str) -> Option<&[MapId]> {
        self.positions
            .get(tag)
            .and_then(|&pos| self.entries.get(pos))
            .map(|entry| entry.map_ids.as_slice())
    }

    pub fn contains_tag(&self, tag: &str) -> bool {
        self.positions.contains_key(tag)
    }

    /// Number of ids recorded under `tag`, zero if absent.
    pub fn match_count(&self, tag: &str) -> usize {
        self.get(tag).map_or(0, <[MapId]>::len)
    }

    /// Number of distinct tags.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-encounter order.
    pub fn iter(&self) -> std::slice::Iter<'_, TagEntry> {
        self.entries.iter()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|entry| entry.tag.as_str())
    }

    /// `(tag, match_count)` pairs in first-encounter order.
    pub fn counts(&self) -> Vec<(String, usize)> {
        self.entries
            .iter()
            .map(|entry| (entry.tag.clone(), entry.match_count()))
            .collect()
    }
}

/// Equality is equality of the mappings; tag order does not take part.
impl PartialEq for TagIndex {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|entry| other.get(&entry.tag) == Some(entry.map_ids.as_slice()))
    }
}

impl Eq for TagIndex {}

impl<'a> IntoIterator for &'a TagIndex {
    type Item = &'a TagEntry;
    type IntoIter = std::slice::Iter<'a, TagEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Accumulates maps into a [`TagIndex`].
#[derive(Debug, Default)]
pub struct TagIndexBuilder {
    index: TagIndex,
}

impl TagIndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the map's id under each of its tags.
    ///
    /// A tag listed twice by the same map records the id twice.
    pub fn add_map(&mut self, map: &MapDocument) {
        for tag in &map.feature_tags {
            match self.index.positions.get(tag).copied() {
                Some(pos) => self.index.entries[pos].map_ids.push(map.id.clone()),
                None => {
                    self.index.positions.insert(tag.clone(), self.index.entries.len());
                    self.index.entries.push(TagEntry {
                        tag: tag.clone(),
                        map_ids: vec![map.id.clone()],
                    });
                }
            }
        }
    }

    pub fn build(self) -> TagIndex {
        self.index
    }
}

/// Build the tag index for a whole collection. Total: an empty collection
/// yields an empty index.
pub fn build_tag_index(collection: &MapCollection) -> TagIndex {
    let mut builder = TagIndexBuilder::new();
    for map in collection {
        builder.add_map(map);
    }

    let index = builder.build();
    tracing::debug!(maps = collection.len(), tags = index.len(), "built tag index");
    index
}
