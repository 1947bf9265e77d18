//! The catalog session: one owner for the collection, its index, the
//! selection and the visible state, driven by [`CatalogEvent`]s.
//!
//! Events are processed one at a time through `&mut self`, and every event
//! either applies fully or leaves the session unchanged.

use map_common::MapCollection;

use crate::engine::{recompute_with_index, VisibleState};
use crate::error::{CatalogError, LoadError};
use crate::loading::{ConnectivityStatus, LoadState};
use crate::selection::SelectionState;
use crate::tag_index::{build_tag_index, TagIndex};

/// Inbound messages to the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEvent {
    StartLoad,
    HandshakeCompleted,
    CredentialsAccepted,
    CollectionLoaded(MapCollection),
    LoadFailed(LoadError),
    TagToggled(String),
    /// Free text typed into the search box. Stored only; it does not filter.
    SearchInputChanged(String),
}

impl CatalogEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::StartLoad => "start_load",
            Self::HandshakeCompleted => "handshake_completed",
            Self::CredentialsAccepted => "credentials_accepted",
            Self::CollectionLoaded(_) => "collection_loaded",
            Self::LoadFailed(_) => "load_failed",
            Self::TagToggled(_) => "tag_toggled",
            Self::SearchInputChanged(_) => "search_input_changed",
        }
    }
}

#[derive(Debug, Default)]
pub struct Catalog {
    state: LoadState,
    collection: Option<MapCollection>,
    tag_index: TagIndex,
    selection: SelectionState,
    visible: VisibleState,
    generation: u64,
    search_input: String,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&mut self, event: CatalogEvent) -> Result<(), CatalogError> {
        let name = event.name();
        let result = match event {
            CatalogEvent::StartLoad => self.transition(LoadState::start),
            CatalogEvent::HandshakeCompleted => self.transition(LoadState::handshake_completed),
            CatalogEvent::CredentialsAccepted => self.transition(LoadState::credentials_accepted),
            CatalogEvent::CollectionLoaded(collection) => self.install(collection),
            CatalogEvent::LoadFailed(error) => {
                tracing::warn!(%error, "map collection load failed");
                self.transition(|state| state.failed(error))
            }
            CatalogEvent::TagToggled(tag) => self.toggle(&tag),
            CatalogEvent::SearchInputChanged(text) => {
                self.search_input = text;
                Ok(())
            }
        };

        if let Err(err) = &result {
            tracing::warn!(
                event = name,
                state = %self.state,
                error = %err,
                "catalog event rejected"
            );
        }
        result
    }

    /// Shorthand for dispatching [`CatalogEvent::TagToggled`].
    pub fn on_tag_toggled(&mut self, tag: &str) -> Result<(), CatalogError> {
        self.dispatch(CatalogEvent::TagToggled(tag.to_string()))
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn status(&self) -> ConnectivityStatus {
        self.state.status()
    }

    /// The last successfully loaded collection, if any.
    pub fn collection(&self) -> Option<&MapCollection> {
        self.collection.as_ref()
    }

    /// Index over the whole loaded collection.
    pub fn tag_index(&self) -> &TagIndex {
        &self.tag_index
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn visible(&self) -> &VisibleState {
        &self.visible
    }

    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    fn transition<F>(&mut self, step: F) -> Result<(), CatalogError>
    where
        F: FnOnce(&LoadState) -> Result<LoadState, CatalogError>,
    {
        let next = step(&self.state)?;
        tracing::info!(from = %self.state, to = %next, "load state changed");
        self.state = next;
        Ok(())
    }

    fn install(&mut self, collection: MapCollection) -> Result<(), CatalogError> {
        let next = self.state.collection_loaded()?;

        self.tag_index = build_tag_index(&collection);
        self.collection = Some(collection);
        self.generation += 1;
        self.selection = SelectionState::new();
        self.state = next;
        self.refresh();

        tracing::info!(
            generation = self.generation,
            maps = self.visible.maps.len(),
            tags = self.tag_index.len(),
            "map collection ready"
        );
        Ok(())
    }

    fn toggle(&mut self, tag: &str) -> Result<(), CatalogError> {
        if !self.state.is_ready() {
            return Err(CatalogError::NotReady);
        }

        self.selection = self.selection.toggle(tag);
        self.refresh();
        Ok(())
    }

    /// Rebuild the visible state from the current collection and selection.
    fn refresh(&mut self) {
        if let Some(collection) = &self.collection {
            self.visible = recompute_with_index(collection, &self.tag_index, &self.selection);
        }
    }
}
