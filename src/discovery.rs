//! One discovery pass over the bus.
//!
//! A pass walks the bus top-down:
//!
//! ```text
//! GET {base}/bus/services                 → [{id}, ...]
//!   GET {base}/services/{id}/capabilities → {endpoints: [{rel, href}, ...]}
//!     GET {resolved href}                 → payload → normalize → store
//! ```
//!
//! Services are visited in list order and endpoints in descriptor order.
//! The first failure aborts the rest of the pass; records appended for
//! earlier endpoints stay in the store.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::BusConfig;
use crate::fetch::{Fetch, FetchError};
use crate::models::{Capabilities, Endpoint, Service};
use crate::normalize::normalize;
use crate::store::RecordStore;

/// Why a pass stopped early.
#[derive(Error, Debug)]
pub enum PassError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("unexpected shape from {url}: {reason}")]
    Shape { url: String, reason: String },
}

/// Counts from a pass that ran to completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub services: usize,
    pub endpoints: usize,
    pub records: usize,
}

/// Walks the bus and feeds normalized records into the store.
#[derive(Clone)]
pub struct DiscoveryWalker {
    bus: BusConfig,
    fetcher: Arc<dyn Fetch>,
    store: RecordStore,
}

impl DiscoveryWalker {
    pub fn new(bus: BusConfig, fetcher: Arc<dyn Fetch>, store: RecordStore) -> Self {
        Self {
            bus,
            fetcher,
            store,
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Run one full pass. Returns on the first failure.
    pub async fn run_one_pass(&self) -> Result<PassSummary, PassError> {
        let mut summary = PassSummary::default();

        let services_url = self.bus.services_url();
        let services: Vec<Value> = self.fetch_as(&services_url, "service list").await?;
        info!(count = services.len(), "discovered services");

        for entry in services {
            let service: Service = decode_shape(&services_url, "service entry", entry)?;
            summary.services += 1;

            let caps_url = self.bus.capabilities_url(&service.id);
            let caps: Capabilities = self.fetch_as(&caps_url, "capability descriptor").await?;
            debug!(
                service = %service.id,
                endpoints = caps.endpoints.len(),
                "fetched capabilities"
            );

            for entry in caps.endpoints {
                let endpoint: Endpoint = decode_shape(&caps_url, "endpoint entry", entry)?;
                let url = self.bus.resolve_href(&endpoint.href);
                let payload = self.fetcher.fetch(&url).await?;
                let records = normalize(&service.id, &endpoint.rel, payload);

                debug!(
                    service = %service.id,
                    kind = %endpoint.rel,
                    records = records.len(),
                    "normalized endpoint payload"
                );

                summary.endpoints += 1;
                summary.records += records.len();
                self.store.append(records);
            }
        }

        Ok(summary)
    }

    async fn fetch_as<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T, PassError> {
        let value = self.fetcher.fetch(url).await?;
        decode_shape(url, what, value)
    }
}

fn decode_shape<T: DeserializeOwned>(url: &str, what: &str, value: Value) -> Result<T, PassError> {
    serde_json::from_value(value).map_err(|e| PassError::Shape {
        url: url.to_string(),
        reason: format!("invalid {}: {}", what, e),
    })
}
