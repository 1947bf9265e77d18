use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Stable identity of a map document (the data service's `_id`).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct MapId(String);

impl MapId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MapId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for MapId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A single map as handed back by the data service.
///
/// Field names on the wire follow the remote payload (`_id`, `featureTags`,
/// `screenShots`), so the same type decodes a `getAllMapData` response directly.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MapDocument {
    /// Unique map identifier
    #[serde(rename = "_id")]
    pub id: MapId,
    /// Feature tags in the order the service lists them
    #[serde(rename = "featureTags", default)]
    pub feature_tags: Vec<String>,
    /// Opaque screenshot references, passed through to the view untouched
    #[serde(rename = "screenShots", default)]
    pub screenshots: Vec<String>,
}

impl MapDocument {
    pub fn new<I, S>(id: impl Into<MapId>, feature_tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            feature_tags: feature_tags.into_iter().map(Into::into).collect(),
            screenshots: Vec::new(),
        }
    }

    pub fn with_screenshots<I, S>(mut self, screenshots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.screenshots = screenshots.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the document lists `tag` among its feature tags.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.feature_tags.iter().any(|t| t == tag)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    #[error("duplicate map id `{0}` in collection")]
    DuplicateId(MapId),
}

/// Ordered, id-unique set of maps produced by one successful load.
///
/// A collection is never mutated after construction; a reload builds a new one.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct MapCollection {
    maps: Vec<MapDocument>,
}

impl MapCollection {
    pub fn new(maps: Vec<MapDocument>) -> Result<Self, CollectionError> {
        let mut seen = HashSet::with_capacity(maps.len());
        for map in &maps {
            if !seen.insert(&map.id) {
                return Err(CollectionError::DuplicateId(map.id.clone()));
            }
        }
        Ok(Self { maps })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Stable subsequence of this collection. Uniqueness carries over from `self`.
    pub fn retain_matching<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&MapDocument) -> bool,
    {
        Self {
            maps: self.maps.iter().filter(|m| keep(m)).cloned().collect(),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MapDocument> {
        self.maps.iter()
    }

    pub fn as_slice(&self) -> &[MapDocument] {
        &self.maps
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    pub fn get(&self, id: &MapId) -> Option<&MapDocument> {
        self.maps.iter().find(|m| &m.id == id)
    }

    pub fn contains(&self, id: &MapId) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = &MapId> + '_ {
        self.maps.iter().map(|m| &m.id)
    }
}

impl<'a> IntoIterator for &'a MapCollection {
    type Item = &'a MapDocument;
    type IntoIter = std::slice::Iter<'a, MapDocument>;

    fn into_iter(self) -> Self::IntoIter {
        self.maps.iter()
    }
}

/// Summary written alongside a catalog snapshot.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CatalogMetadata {
    /// Number of maps in the snapshot
    pub map_count: usize,
    /// Number of distinct feature tags across all maps
    pub tag_count: usize,
    /// When the snapshot was built
    pub created_at: DateTime<Utc>,
    /// Snapshot format version, e.g. "1.0"
    pub version: String,
}

/// Serialized form of a whole catalog: metadata plus every map in load order.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CatalogSnapshot {
    pub metadata: CatalogMetadata,
    pub maps: Vec<MapDocument>,
}

impl CatalogSnapshot {
    pub fn new(maps: Vec<MapDocument>, version: [u8; 2]) -> Self {
        let tag_count = maps
            .iter()
            .flat_map(|m| m.feature_tags.iter())
            .collect::<HashSet<_>>()
            .len();

        Self {
            metadata: CatalogMetadata {
                map_count: maps.len(),
                tag_count,
                created_at: Utc::now(),
                version: format!("{}.{}", version[0], version[1]),
            },
            maps,
        }
    }

    pub fn into_collection(self) -> Result<MapCollection, CollectionError> {
        MapCollection::new(self.maps)
    }
}
