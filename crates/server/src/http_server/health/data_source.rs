use std::fmt::Debug;
use std::ops::Deref;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use http::request::Parts;

use crate::ServiceState;

#[async_trait]
pub trait DataSource {
    /// Perform various checks on the system to ensure its healthy and ready to accept requests.
    async fn is_ready(&self) -> Result<(), DataSourceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DataSourceError {
    #[error("user directory is not readable")]
    Directory,
    #[error("blob store is not available")]
    Store,
    #[error("config vault is not available")]
    Vault,
    #[error("readiness check did not complete")]
    Check,
}

pub type DynDataSource = Arc<dyn DataSource + Send + Sync>;

pub struct StateDataSource(DynDataSource);

impl Debug for StateDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateDataSource").finish()
    }
}

impl StateDataSource {
    #[cfg(test)]
    pub fn new(dds: DynDataSource) -> Self {
        Self(dds)
    }
}

impl Deref for StateDataSource {
    type Target = DynDataSource;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Ready when the user directory parses and both storage roots exist.
struct StorageSource {
    state: ServiceState,
}

#[async_trait]
impl DataSource for StorageSource {
    async fn is_ready(&self) -> Result<(), DataSourceError> {
        self.state
            .blocking(|s| {
                s.directory()
                    .lookup("")
                    .map_err(|_| DataSourceError::Directory)?;
                if !s.store().root().is_dir() {
                    return Err(DataSourceError::Store);
                }
                if !s.vault().root().is_dir() {
                    return Err(DataSourceError::Vault);
                }
                Ok(())
            })
            .await
            .map_err(|_| DataSourceError::Check)?
    }
}

#[async_trait]
impl FromRequestParts<ServiceState> for StateDataSource {
    type Rejection = ();

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &ServiceState,
    ) -> Result<Self, Self::Rejection> {
        Ok(StateDataSource(Arc::new(StorageSource {
            state: state.clone(),
        })))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[derive(Clone)]
    pub(crate) enum MockReadiness {
        StoreDown,
        Ready,
    }

    #[async_trait]
    impl DataSource for MockReadiness {
        async fn is_ready(&self) -> Result<(), DataSourceError> {
            match self {
                MockReadiness::StoreDown => Err(DataSourceError::Store),
                MockReadiness::Ready => Ok(()),
            }
        }
    }
}
