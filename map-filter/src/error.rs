use map_common::{CodecError, CollectionError};
use thiserror::Error;

use crate::config::ServiceConfig;
use crate::loading::LoadState;

/// Handshake or login with the data service failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityError {
    #[error("handshake with app `{app_id}` failed: {reason}")]
    Handshake { app_id: String, reason: String },

    #[error("anonymous login rejected: {0}")]
    Auth(String),
}

/// Retrieving the collection failed after a successful login.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("remote function `{function}` failed: {reason}")]
    Remote { function: String, reason: String },

    #[error("malformed collection payload: {0}")]
    Payload(String),
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Payload(err.to_string())
    }
}

impl From<CodecError> for FetchError {
    fn from(err: CodecError) -> Self {
        Self::Payload(err.to_string())
    }
}

/// Why a load attempt ended in `Failed`. Terminal for that attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error(transparent)]
    Connectivity(#[from] ConnectivityError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl LoadError {
    /// Build the error for a failed load step reported by name: "handshake",
    /// "auth" or "fetch".
    pub fn from_stage(
        stage: &str,
        message: &str,
        config: &ServiceConfig,
    ) -> Result<Self, CatalogError> {
        let error: Self = match stage {
            "handshake" => ConnectivityError::Handshake {
                app_id: config.app_id.clone(),
                reason: message.to_string(),
            }
            .into(),
            "auth" => ConnectivityError::Auth(message.to_string()).into(),
            "fetch" => FetchError::Remote {
                function: config.function_name.clone(),
                reason: message.to_string(),
            }
            .into(),
            other => return Err(CatalogError::UnknownStage(other.to_string())),
        };
        Ok(error)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("event `{event}` is not valid while {state}")]
    InvalidTransition { state: LoadState, event: &'static str },

    #[error("no collection loaded yet")]
    NotReady,

    #[error("a load is already in progress")]
    LoadInProgress,

    #[error(transparent)]
    Collection(#[from] CollectionError),

    #[error("load failed: {0}")]
    Load(#[from] LoadError),

    #[error("unknown load stage `{0}`")]
    UnknownStage(String),

    #[error("failed to serialize view: {0}")]
    View(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use testresult::TestResult;

    #[test]
    fn stages_map_to_their_errors() -> TestResult {
        let config = ServiceConfig::default();

        assert_eq!(
            LoadError::from_stage("handshake", "timeout", &config)?,
            LoadError::Connectivity(ConnectivityError::Handshake {
                app_id: config.app_id.clone(),
                reason: "timeout".to_string(),
            })
        );
        assert_eq!(
            LoadError::from_stage("auth", "expired", &config)?,
            LoadError::Connectivity(ConnectivityError::Auth("expired".to_string()))
        );
        assert_eq!(
            LoadError::from_stage("fetch", "500", &config)?,
            LoadError::Fetch(FetchError::Remote {
                function: config.function_name.clone(),
                reason: "500".to_string(),
            })
        );
        Ok(())
    }

    #[test]
    fn unknown_stage_is_rejected() {
        let result = LoadError::from_stage("Handshake", "timeout", &ServiceConfig::default());

        assert_eq!(result, Err(CatalogError::UnknownStage("Handshake".to_string())));
    }

    #[test]
    fn view_error_names_the_cause() {
        let error = CatalogError::View("unsupported map key".to_string());

        assert_eq!(error.to_string(), "failed to serialize view: unsupported map key");
    }
}
