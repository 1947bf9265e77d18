//! Boundary with the remote data service.
//!
//! The service is consumed through [`MapDataService`]; [`load_catalog`] walks a
//! [`Catalog`] through the load lifecycle while awaiting each call.

use async_trait::async_trait;
use map_common::{compression, CatalogSnapshot, MapCollection, MapDocument};
use serde::Deserialize;

use crate::catalog::{Catalog, CatalogEvent};
use crate::config::{ServiceConfig, DEFAULT_FUNCTION};
use crate::error::{CatalogError, ConnectivityError, FetchError, LoadError};

/// The three calls a load needs: handshake, anonymous login, and the remote
/// function returning every map.
#[async_trait(?Send)]
pub trait MapDataService {
    async fn initialize(&self, app_id: &str) -> Result<(), ConnectivityError>;

    async fn login_anonymous(&self) -> Result<(), ConnectivityError>;

    async fn call_function(&self, name: &str) -> Result<Vec<MapDocument>, FetchError>;
}

/// Run one full load against `service`.
///
/// Every step is dispatched into `catalog`. A failing call moves the catalog
/// to `Failed` and is returned; nothing is retried here.
pub async fn load_catalog<S>(
    catalog: &mut Catalog,
    service: &S,
    config: &ServiceConfig,
) -> Result<(), CatalogError>
where
    S: MapDataService + ?Sized,
{
    catalog.dispatch(CatalogEvent::StartLoad)?;

    match fetch(catalog, service, config).await {
        Ok(collection) => catalog.dispatch(CatalogEvent::CollectionLoaded(collection)),
        Err(error) => {
            catalog.dispatch(CatalogEvent::LoadFailed(error.clone()))?;
            Err(error.into())
        }
    }
}

async fn fetch<S>(
    catalog: &mut Catalog,
    service: &S,
    config: &ServiceConfig,
) -> Result<MapCollection, LoadError>
where
    S: MapDataService + ?Sized,
{
    service.initialize(&config.app_id).await?;
    advance(catalog, CatalogEvent::HandshakeCompleted);

    service.login_anonymous().await?;
    advance(catalog, CatalogEvent::CredentialsAccepted);

    let maps = service.call_function(&config.function_name).await?;
    MapCollection::new(maps).map_err(|err| FetchError::Payload(err.to_string()).into())
}

// The catalog is borrowed exclusively for the whole load, so these steps
// cannot be out of order.
fn advance(catalog: &mut Catalog, event: CatalogEvent) {
    if let Err(err) = catalog.dispatch(event) {
        tracing::error!(error = %err, "load step rejected");
    }
}

/// Serves a fixed list of maps, e.g. decoded from a catalog snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotService {
    function: String,
    maps: Vec<MapDocument>,
}

impl SnapshotService {
    pub fn new(maps: Vec<MapDocument>) -> Self {
        Self {
            function: DEFAULT_FUNCTION.to_string(),
            maps,
        }
    }

    /// Decode a compressed [`CatalogSnapshot`].
    pub fn from_compressed(data: &[u8]) -> Result<Self, FetchError> {
        let snapshot: CatalogSnapshot = compression::from_compressed(data)?;
        tracing::debug!(
            maps = snapshot.metadata.map_count,
            version = %snapshot.metadata.version,
            "decoded catalog snapshot"
        );
        Ok(Self::new(snapshot.maps))
    }

    /// Serve the maps under a different remote function name.
    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = function.into();
        self
    }
}

#[async_trait(?Send)]
impl MapDataService for SnapshotService {
    async fn initialize(&self, _app_id: &str) -> Result<(), ConnectivityError> {
        Ok(())
    }

    async fn login_anonymous(&self) -> Result<(), ConnectivityError> {
        Ok(())
    }

    async fn call_function(&self, name: &str) -> Result<Vec<MapDocument>, FetchError> {
        if name != self.function {
            return Err(FetchError::Remote {
                function: name.to_string(),
                reason: "no such function".to_string(),
            });
        }
        Ok(self.maps.clone())
    }
}

/// A remote function response: either the bare array or wrapped in `result`.
#[derive(Deserialize)]
#[serde(untagged)]
enum FunctionResponse {
    Wrapped { result: Vec<MapDocument> },
    Bare(Vec<MapDocument>),
}

/// Decode the JSON body of a `getAllMapData` response.
pub fn parse_function_response(json: &str) -> Result<Vec<MapDocument>, FetchError> {
    let maps = match serde_json::from_str(json)? {
        FunctionResponse::Wrapped { result } => result,
        FunctionResponse::Bare(maps) => maps,
    };
    Ok(maps)
}

/// Serves a captured JSON response of the remote function.
#[derive(Debug, Clone)]
pub struct JsonService {
    body: String,
}

impl JsonService {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

#[async_trait(?Send)]
impl MapDataService for JsonService {
    async fn initialize(&self, _app_id: &str) -> Result<(), ConnectivityError> {
        Ok(())
    }

    async fn login_anonymous(&self) -> Result<(), ConnectivityError> {
        Ok(())
    }

    async fn call_function(&self, _name: &str) -> Result<Vec<MapDocument>, FetchError> {
        parse_function_response(&self.body)
    }
}
