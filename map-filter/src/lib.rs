use wasm_bindgen::prelude::*;
use map_common::{compression, CatalogSnapshot, MapCollection, MapDocument};
use once_cell::sync::OnceCell;
use std::sync::Mutex;
use web_sys::console;

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod loading;
pub mod selection;
pub mod service;
pub mod tag_index;
pub mod view;

pub use catalog::{Catalog, CatalogEvent};
pub use config::ServiceConfig;
pub use engine::{recompute, recompute_with_index, VisibleState};
pub use error::{CatalogError, ConnectivityError, FetchError, LoadError};
pub use loading::{ConnectivityStatus, LoadState};
pub use selection::SelectionState;
pub use service::{load_catalog, JsonService, MapDataService, SnapshotService};
pub use tag_index::{build_tag_index, TagEntry, TagIndex, TagIndexBuilder};
pub use view::{project, CatalogView, MapCard, TagChip};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

// One catalog per page, created on first use and never replaced.
static CATALOG: OnceCell<Mutex<Catalog>> = OnceCell::new();
static CONFIG: OnceCell<ServiceConfig> = OnceCell::new();

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn with_catalog<T>(f: impl FnOnce(&mut Catalog) -> Result<T, CatalogError>) -> Result<T, JsValue> {
    let cell = CATALOG.get_or_init(|| Mutex::new(Catalog::new()));
    let mut catalog = cell
        .lock()
        .map_err(|_| JsValue::from_str("catalog lock poisoned"))?;

    f(&mut *catalog).map_err(|e| {
        console::warn_1(&JsValue::from_str(&format!("map catalog: {e}")));
        JsValue::from_str(&e.to_string())
    })
}

fn view_value(catalog: &Catalog) -> Result<JsValue, CatalogError> {
    serde_wasm_bindgen::to_value(&view::project(catalog))
        .map_err(|e| CatalogError::View(e.to_string()))
}

fn deliver(maps: Result<Vec<MapDocument>, FetchError>) -> Result<JsValue, JsValue> {
    with_catalog(|catalog| {
        let collection = maps.and_then(|maps| {
            MapCollection::new(maps).map_err(|e| FetchError::Payload(e.to_string()))
        });

        match collection {
            Ok(collection) => catalog.dispatch(CatalogEvent::CollectionLoaded(collection))?,
            Err(e) => {
                let error = LoadError::from(e);
                catalog.dispatch(CatalogEvent::LoadFailed(error.clone()))?;
                return Err(error.into());
            }
        }
        view_value(catalog)
    })
}

/// JavaScript interface to the map catalog.
///
/// The page owns the data-service SDK and reports each load step here; the
/// catalog tracks the lifecycle, filters, and hands back render-ready views.
#[wasm_bindgen]
pub struct MapFilterJS;

#[wasm_bindgen]
impl MapFilterJS {
    /// Set up the catalog and return the service config (`appId`,
    /// `functionName`) the page should use. Later calls return the first config.
    #[wasm_bindgen]
    pub fn init(config_json: &str) -> Result<JsValue, JsValue> {
        console_error_panic_hook::set_once();

        let config = CONFIG.get_or_try_init(|| {
            ServiceConfig::from_json(config_json).map_err(|e| {
                console::log_1(&JsValue::from_str(&format!("invalid catalog config: {e}")));
                JsValue::from_str(&e.to_string())
            })
        })?;
        CATALOG.get_or_init(|| Mutex::new(Catalog::new()));

        serde_wasm_bindgen::to_value(config).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen]
    pub fn begin_load() -> Result<(), JsValue> {
        with_catalog(|catalog| catalog.dispatch(CatalogEvent::StartLoad))
    }

    #[wasm_bindgen]
    pub fn handshake_completed() -> Result<(), JsValue> {
        with_catalog(|catalog| catalog.dispatch(CatalogEvent::HandshakeCompleted))
    }

    #[wasm_bindgen]
    pub fn credentials_accepted() -> Result<(), JsValue> {
        with_catalog(|catalog| catalog.dispatch(CatalogEvent::CredentialsAccepted))
    }

    /// Hand over the remote function's JSON response. Returns the new view.
    #[wasm_bindgen]
    pub fn collection_loaded(response_json: &str) -> Result<JsValue, JsValue> {
        deliver(service::parse_function_response(response_json))
    }

    /// Hand over a compressed catalog snapshot instead of a live response.
    #[wasm_bindgen]
    pub fn snapshot_loaded(data: &[u8]) -> Result<JsValue, JsValue> {
        let maps = compression::from_compressed::<CatalogSnapshot>(data)
            .map(|snapshot| snapshot.maps)
            .map_err(FetchError::from);
        deliver(maps)
    }

    /// Report a failed load step: `stage` is "handshake", "auth" or "fetch".
    #[wasm_bindgen]
    pub fn load_failed(stage: &str, message: &str) -> Result<(), JsValue> {
        let config = CONFIG.get().cloned().unwrap_or_default();
        let error = LoadError::from_stage(stage, message, &config)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        console::log_1(&JsValue::from_str(&format!("map catalog load failed: {error}")));

        with_catalog(|catalog| catalog.dispatch(CatalogEvent::LoadFailed(error)))
    }

    /// Toggle a tag and return the recomputed view.
    #[wasm_bindgen]
    pub fn toggle_tag(tag: &str) -> Result<JsValue, JsValue> {
        with_catalog(|catalog| {
            catalog.on_tag_toggled(tag)?;
            view_value(catalog)
        })
    }

    #[wasm_bindgen]
    pub fn set_search_input(text: &str) -> Result<(), JsValue> {
        with_catalog(|catalog| catalog.dispatch(CatalogEvent::SearchInputChanged(text.to_string())))
    }

    #[wasm_bindgen]
    pub fn view() -> Result<JsValue, JsValue> {
        with_catalog(|catalog| view_value(catalog))
    }

    #[wasm_bindgen]
    pub fn selected_tags() -> Result<js_sys::Array, JsValue> {
        with_catalog(|catalog| {
            Ok(catalog
                .selection()
                .iter()
                .map(JsValue::from_str)
                .collect::<js_sys::Array>())
        })
    }
}
