use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::app::ports::{CarrierRouteCandidate, CarrierRoutePort, CarrierRouteRequest};
use crate::domain::Address;
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::responder::{Responder, SessionContext};

/// Annotates each address with the delivery route from a carrier-route lookup.
///
/// Expects addresses that have already been validated, since validation may
/// replace entries wholesale and would drop any route set before it.
pub struct CarrierRouteRetrieverResponder {
    lookup: Arc<dyn CarrierRoutePort>,
    concurrency: NonZeroUsize,
}

impl CarrierRouteRetrieverResponder {
    pub fn new(lookup: Arc<dyn CarrierRoutePort>) -> Self {
        Self {
            lookup,
            concurrency: NonZeroUsize::MIN,
        }
    }

    pub fn with_concurrency(mut self, limit: NonZeroUsize) -> Self {
        self.concurrency = limit;
        self
    }

    #[instrument(skip(self, address), fields(address = %address))]
    async fn route_one(&self, mut address: Address) -> Result<Address> {
        let request = CarrierRouteRequest::from_address(&address);
        let candidates = self.lookup.lookup(&request).await?;

        match first_carrier_route(&candidates) {
            Some(route) => {
                debug!(route = %route, "Carrier route assigned");
                address.set_carrier_route(route);
                metrics::carrier_route::assigned();
            }
            None => {
                debug!(candidates = candidates.len(), "No candidate carried a route");
                metrics::carrier_route::missing();
            }
        }
        Ok(address)
    }
}

#[async_trait]
impl Responder for CarrierRouteRetrieverResponder {
    fn name(&self) -> &str {
        "carrier_route"
    }

    async fn respond(&self, addresses: Vec<Address>, _ctx: &SessionContext) -> Result<Vec<Address>> {
        stream::iter(addresses.into_iter().map(|address| self.route_one(address)))
            .buffered(self.concurrency.get())
            .try_collect::<Vec<_>>()
            .await
    }
}

/// First non-empty route in response order, as received. First match wins,
/// not best match.
pub fn first_carrier_route(candidates: &[CarrierRouteCandidate]) -> Option<&str> {
    candidates
        .iter()
        .filter_map(|c| c.carrier_route.as_deref())
        .find(|route| !route.is_empty())
}
