//! Render-ready projections of a [`Catalog`].

use map_common::{MapDocument, MapId};
use serde::Serialize;

use crate::catalog::Catalog;
use crate::loading::ConnectivityStatus;
use crate::selection::SelectionState;
use crate::tag_index::TagIndex;

/// One map card: its name and screenshots.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MapCard {
    pub id: MapId,
    pub screenshots: Vec<String>,
}

impl From<&MapDocument> for MapCard {
    fn from(map: &MapDocument) -> Self {
        Self {
            id: map.id.clone(),
            screenshots: map.screenshots.clone(),
        }
    }
}

/// One clickable tag with the number of visible maps carrying it.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TagChip {
    pub tag: String,
    pub match_count: usize,
    pub selected: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogView {
    pub status: ConnectivityStatus,
    /// "database {status} | {n} maps visible"
    pub status_badge: String,
    /// `None` until a collection has been loaded.
    pub maps: Option<Vec<MapCard>>,
    pub tags: Vec<TagChip>,
    /// "{n} visible"
    pub tags_badge: String,
    /// Selected tags, comma-joined in click order.
    pub selection_text: String,
    pub search_input: String,
}

/// Tag chips in first-encounter order of the visible index.
pub fn tag_chips(index: &TagIndex, selection: &SelectionState) -> Vec<TagChip> {
    index
        .iter()
        .map(|entry| TagChip {
            tag: entry.tag.clone(),
            match_count: entry.match_count(),
            selected: selection.contains(&entry.tag),
        })
        .collect()
}

pub fn status_badge(status: ConnectivityStatus, visible_maps: usize) -> String {
    format!("database {} | {} maps visible", status.label(), visible_maps)
}

pub fn project(catalog: &Catalog) -> CatalogView {
    let visible = catalog.visible();
    let status = catalog.status();
    let maps = catalog
        .collection()
        .map(|_| visible.maps.iter().map(MapCard::from).collect::<Vec<_>>());

    CatalogView {
        status,
        status_badge: status_badge(status, visible.maps.len()),
        maps,
        tags: tag_chips(&visible.tag_index, catalog.selection()),
        tags_badge: format!("{} visible", visible.tag_index.len()),
        selection_text: catalog.selection().to_text(),
        search_input: catalog.search_input().to_string(),
    }
}
