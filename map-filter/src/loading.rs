//! Load lifecycle: `Idle → Connecting → Authenticating → FetchingCollection → Ready`,
//! with `Failed` reachable from any in-flight state.

use serde::Serialize;
use std::fmt;

use crate::error::{CatalogError, LoadError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Idle,
    Connecting,
    Authenticating,
    FetchingCollection,
    Ready,
    Failed(LoadError),
}

/// Connectivity as shown to the user.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ConnectivityStatus {
    NotConnected,
    Connecting,
    Connected,
    Failed,
}

impl ConnectivityStatus {
    /// Badge wording, "database {label} | ..."
    pub fn label(self) -> &'static str {
        match self {
            Self::NotConnected => "is NOT connected",
            Self::Connecting => "is connecting...",
            Self::Connected => "IS connected",
            Self::Failed => "FAILED to connect",
        }
    }
}

impl LoadState {
    pub fn status(&self) -> ConnectivityStatus {
        match self {
            Self::Idle => ConnectivityStatus::NotConnected,
            Self::Connecting | Self::Authenticating => ConnectivityStatus::Connecting,
            Self::FetchingCollection | Self::Ready => ConnectivityStatus::Connected,
            Self::Failed(_) => ConnectivityStatus::Failed,
        }
    }

    /// A load has started and has not yet reached `Ready` or `Failed`.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            Self::Connecting | Self::Authenticating | Self::FetchingCollection
        )
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Begin a load. Allowed from `Idle`, and from `Ready`/`Failed` as a reload.
    pub fn start(&self) -> Result<Self, CatalogError> {
        match self {
            Self::Idle | Self::Ready | Self::Failed(_) => Ok(Self::Connecting),
            _ => Err(CatalogError::LoadInProgress),
        }
    }

    pub fn handshake_completed(&self) -> Result<Self, CatalogError> {
        self.advance(Self::Connecting, Self::Authenticating, "handshake_completed")
    }

    pub fn credentials_accepted(&self) -> Result<Self, CatalogError> {
        self.advance(Self::Authenticating, Self::FetchingCollection, "credentials_accepted")
    }

    pub fn collection_loaded(&self) -> Result<Self, CatalogError> {
        self.advance(Self::FetchingCollection, Self::Ready, "collection_loaded")
    }

    pub fn failed(&self, error: LoadError) -> Result<Self, CatalogError> {
        if self.is_in_flight() {
            Ok(Self::Failed(error))
        } else {
            Err(self.invalid("load_failed"))
        }
    }

    fn advance(&self, from: Self, to: Self, event: &'static str) -> Result<Self, CatalogError> {
        if *self == from {
            Ok(to)
        } else {
            Err(self.invalid(event))
        }
    }

    fn invalid(&self, event: &'static str) -> CatalogError {
        CatalogError::InvalidTransition {
            state: self.clone(),
            event,
        }
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Connecting => f.write_str("connecting"),
            Self::Authenticating => f.write_str("authenticating"),
            Self::FetchingCollection => f.write_str("fetching collection"),
            Self::Ready => f.write_str("ready"),
            Self::Failed(err) => write!(f, "failed ({err})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConnectivityError, FetchError};
    use testresult::TestResult;

    fn auth_error() -> LoadError {
        ConnectivityError::Auth("denied".to_string()).into()
    }

    #[test]
    fn happy_path_reaches_ready() -> TestResult {
        let state = LoadState::Idle
            .start()?
            .handshake_completed()?
            .credentials_accepted()?
            .collection_loaded()?;

        assert_eq!(state, LoadState::Ready);
        assert_eq!(state.status(), ConnectivityStatus::Connected);
        Ok(())
    }

    #[test]
    fn status_follows_state() -> TestResult {
        assert_eq!(LoadState::Idle.status(), ConnectivityStatus::NotConnected);
        assert_eq!(LoadState::Connecting.status(), ConnectivityStatus::Connecting);
        assert_eq!(LoadState::Authenticating.status(), ConnectivityStatus::Connecting);
        assert_eq!(LoadState::FetchingCollection.status(), ConnectivityStatus::Connected);
        assert_eq!(
            LoadState::Authenticating.failed(auth_error())?.status(),
            ConnectivityStatus::Failed
        );
        Ok(())
    }

    #[test]
    fn failure_only_from_in_flight_states() -> TestResult {
        for state in [
            LoadState::Connecting,
            LoadState::Authenticating,
            LoadState::FetchingCollection,
        ] {
            assert!(matches!(state.failed(auth_error())?, LoadState::Failed(_)));
        }

        let fetch = LoadError::from(FetchError::Payload("bad".to_string()));
        assert!(LoadState::Idle.failed(fetch.clone()).is_err());
        assert!(LoadState::Ready.failed(fetch).is_err());
        Ok(())
    }

    #[test]
    fn start_is_rejected_while_loading() {
        for state in [
            LoadState::Connecting,
            LoadState::Authenticating,
            LoadState::FetchingCollection,
        ] {
            assert_eq!(state.start(), Err(CatalogError::LoadInProgress));
        }
    }

    #[test]
    fn reload_allowed_after_ready_or_failure() -> TestResult {
        assert_eq!(LoadState::Ready.start()?, LoadState::Connecting);
        assert_eq!(LoadState::Failed(auth_error()).start()?, LoadState::Connecting);
        Ok(())
    }

    #[test]
    fn out_of_order_steps_are_rejected() {
        let result = LoadState::Connecting.collection_loaded();

        assert_eq!(
            result,
            Err(CatalogError::InvalidTransition {
                state: LoadState::Connecting,
                event: "collection_loaded",
            })
        );
    }
}
