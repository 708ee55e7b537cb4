//! Application state for the query service.

use metrics_exporter_prometheus::PrometheusHandle;

use aq_common::AqResult;
use storage::{Queries, StorageAdapter, StorageConfig};

/// Shared application state.
pub struct AppState {
    /// Resolved store; decides table qualification for every query.
    pub storage: StorageAdapter,

    /// Read queries bound to the store's mode.
    pub queries: Queries,

    /// Prometheus recorder handle, when one is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Resolve the store from `config` (falling back if the primary is down).
    pub async fn new(config: &StorageConfig, prometheus: Option<PrometheusHandle>) -> AqResult<Self> {
        let storage = StorageAdapter::connect(config).await?;
        Ok(Self::from_adapter(storage, prometheus))
    }

    pub fn from_adapter(storage: StorageAdapter, prometheus: Option<PrometheusHandle>) -> Self {
        let queries = Queries::new(&storage);
        Self {
            storage,
            queries,
            prometheus,
        }
    }
}
