use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::app::ports::{AddressCandidate, AddressLookupPort};
use crate::domain::Address;
use crate::error::{EnrichError, Result};
use crate::observability::metrics;
use crate::pipeline::responder::{Responder, SessionContext};

/// Outcome of checking one address against its best candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// No candidate came back; the address is trusted as given.
    NoCandidate,
    /// The best candidate matches on every core field.
    Confirmed,
    /// The best candidate differs; it replaces the address.
    Corrected(Address),
}

/// Confirms or corrects each address against an address-candidate lookup.
pub struct AddressValidationResponder {
    lookup: Arc<dyn AddressLookupPort>,
    concurrency: NonZeroUsize,
}

impl AddressValidationResponder {
    pub fn new(lookup: Arc<dyn AddressLookupPort>) -> Self {
        Self {
            lookup,
            concurrency: NonZeroUsize::MIN,
        }
    }

    /// Allow up to `limit` lookups in flight. Output order is unaffected.
    pub fn with_concurrency(mut self, limit: NonZeroUsize) -> Self {
        self.concurrency = limit;
        self
    }

    #[instrument(skip(self, address), fields(address = %address))]
    async fn validate_one(&self, address: Address) -> Result<Address> {
        let query = single_line_query(&address);
        let candidates = self.lookup.find_candidates(&query).await?;

        match validate(&address, candidates.first())? {
            Verdict::NoCandidate => {
                debug!("No candidates returned, keeping address as given");
                metrics::validation::no_candidate();
                Ok(address)
            }
            Verdict::Confirmed => {
                metrics::validation::confirmed();
                Ok(address)
            }
            Verdict::Corrected(corrected) => {
                info!(corrected = %corrected, "Address corrected by lookup");
                metrics::validation::corrected();
                Ok(corrected)
            }
        }
    }
}

#[async_trait]
impl Responder for AddressValidationResponder {
    fn name(&self) -> &str {
        "address_validation"
    }

    async fn respond(&self, addresses: Vec<Address>, _ctx: &SessionContext) -> Result<Vec<Address>> {
        // `buffered` yields in submission order; `try_collect` stops at the first error.
        stream::iter(addresses.into_iter().map(|address| self.validate_one(address)))
            .buffered(self.concurrency.get())
            .try_collect::<Vec<_>>()
            .await
    }
}

/// Free-form query line for the lookup, e.g. "123 Main St apt #4 Springfield IL 62704".
pub fn single_line_query(address: &Address) -> String {
    match address.apt_number() {
        Some(apt) => format!(
            "{} {} apt #{} {} {} {}",
            address.street_number(),
            address.street_name(),
            apt,
            address.city(),
            address.state(),
            address.zip()
        ),
        None => format!(
            "{} {} {} {} {}",
            address.street_number(),
            address.street_name(),
            address.city(),
            address.state(),
            address.zip()
        ),
    }
}

/// Compare an address with the best candidate, if any.
///
/// Fails when the candidate cannot produce a complete address.
pub fn validate(address: &Address, best: Option<&AddressCandidate>) -> Result<Verdict> {
    let Some(candidate) = best else {
        return Ok(Verdict::NoCandidate);
    };

    let received = candidate_to_address(candidate)?;
    if &received == address {
        Ok(Verdict::Confirmed)
    } else {
        Ok(Verdict::Corrected(received))
    }
}

/// Build an address from candidate attributes with the ordinary builder rules.
pub fn candidate_to_address(candidate: &AddressCandidate) -> Result<Address> {
    let attrs = &candidate.attributes;
    // A bare street type is not a street name.
    let st_name = attrs
        .st_name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| EnrichError::MissingField("StName".to_string()))?;
    let street_name = format!("{} {}", st_name, attrs.st_type.as_deref().unwrap_or_default());

    let mut builder = Address::builder().street_name(street_name.trim());
    if let Some(v) = &attrs.add_num {
        builder = builder.street_number(v.as_str());
    }
    if let Some(v) = &attrs.sub_addr {
        builder = builder.apt_number(v.as_str());
    }
    if let Some(v) = &attrs.city {
        builder = builder.city(v.as_str());
    }
    if let Some(v) = &attrs.region_abbr {
        builder = builder.state(v.as_str());
    }
    if let Some(v) = &attrs.postal {
        builder = builder.zip(v.as_str());
    }
    builder.build()
}
