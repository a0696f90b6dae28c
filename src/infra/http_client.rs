use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::app::ports::{
    AddressCandidate, AddressLookupPort, CarrierRouteCandidate, CarrierRoutePort, CarrierRouteRequest,
};
use crate::config::LookupConfig;
use crate::constants::{LOOKUP_ALL_FIELDS, LOOKUP_COUNTRY_CODE, LOOKUP_FORMAT};
use crate::error::Result;

/// Response body of the address-candidate lookup. `candidates` is required.
#[derive(Debug, Deserialize)]
pub struct CandidatesResponse {
    pub candidates: Vec<AddressCandidate>,
}

/// Response body of the carrier-route lookup. `addressList` is required.
#[derive(Debug, Deserialize)]
pub struct AddressListResponse {
    #[serde(rename = "addressList")]
    pub address_list: Vec<CarrierRouteCandidate>,
}

fn build_client(config: &LookupConfig) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .build()?)
}

/// Query parameters for a single-line address lookup, restricted to the US.
pub fn candidate_query(single_line: &str) -> [(&'static str, &str); 4] {
    [
        ("SingleLine", single_line),
        ("f", LOOKUP_FORMAT),
        ("outFields", LOOKUP_ALL_FIELDS),
        ("countryCode", LOOKUP_COUNTRY_CODE),
    ]
}

/// Address-candidate lookup against an ArcGIS-style geocoder.
pub struct ArcGisAddressLookup {
    client: reqwest::Client,
    url: String,
    user_agent: String,
}

impl ArcGisAddressLookup {
    pub fn new(config: &LookupConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
            url: config.address_lookup_url.clone(),
            user_agent: config.user_agent.clone(),
        })
    }
}

#[async_trait]
impl AddressLookupPort for ArcGisAddressLookup {
    async fn find_candidates(&self, single_line: &str) -> Result<Vec<AddressCandidate>> {
        let resp = self
            .client
            .get(&self.url)
            .header(USER_AGENT, &self.user_agent)
            .query(&candidate_query(single_line))
            .send()
            .await?
            .error_for_status()?;
        let bytes = resp.bytes().await?;
        let body: CandidatesResponse = serde_json::from_slice(&bytes)?;
        debug!(candidates = body.candidates.len(), "Address lookup returned");
        Ok(body.candidates)
    }
}

/// Carrier-route lookup against a USPS-style zip-by-address endpoint.
pub struct UspsCarrierRouteLookup {
    client: reqwest::Client,
    url: String,
    user_agent: String,
}

impl UspsCarrierRouteLookup {
    pub fn new(config: &LookupConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
            url: config.carrier_route_url.clone(),
            user_agent: config.user_agent.clone(),
        })
    }
}

#[async_trait]
impl CarrierRoutePort for UspsCarrierRouteLookup {
    async fn lookup(&self, request: &CarrierRouteRequest) -> Result<Vec<CarrierRouteCandidate>> {
        let resp = self
            .client
            .post(&self.url)
            .header(USER_AGENT, &self.user_agent)
            .form(request)
            .send()
            .await?
            .error_for_status()?;
        let bytes = resp.bytes().await?;
        let body: AddressListResponse = serde_json::from_slice(&bytes)?;
        debug!(entries = body.address_list.len(), "Carrier route lookup returned");
        Ok(body.address_list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_is_restricted_to_us_with_all_fields() {
        let query = candidate_query("123 Main St Springfield IL 62704");
        assert_eq!(query[0], ("SingleLine", "123 Main St Springfield IL 62704"));
        assert!(query.contains(&("f", "json")));
        assert!(query.contains(&("outFields", "*")));
        assert!(query.contains(&("countryCode", "US")));
    }

    #[test]
    fn parses_candidates_response() {
        let body = json!({
            "spatialReference": { "wkid": 4326 },
            "candidates": [
                {
                    "address": "123 Main St, Springfield, Illinois, 62704",
                    "score": 100,
                    "attributes": {
                        "AddNum": "123", "StName": "Main", "StType": "St", "SubAddr": "",
                        "City": "Springfield", "RegionAbbr": "IL", "Postal": "62704",
                        "Score": 100
                    }
                }
            ]
        });
        let parsed: CandidatesResponse = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.candidates[0].attributes.st_type.as_deref(), Some("St"));
    }

    #[test]
    fn missing_candidates_key_is_a_schema_error() {
        let body = json!({ "error": { "code": 400, "message": "Unable to complete operation." } });
        assert!(serde_json::from_value::<CandidatesResponse>(body).is_err());
    }

    #[test]
    fn parses_address_list_response() {
        let body = json!({
            "resultStatus": "SUCCESS",
            "addressList": [
                { "addressLine1": "123 MAIN ST", "carrierRoute": "C001" },
                { "addressLine1": "123 MAIN ST", "carrierRoute": "" }
            ]
        });
        let parsed: AddressListResponse = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.address_list.len(), 2);
        assert_eq!(parsed.address_list[0].carrier_route.as_deref(), Some("C001"));
    }

    #[test]
    fn missing_address_list_is_a_schema_error() {
        let body = json!({ "resultStatus": "ADDRESS NOT FOUND" });
        assert!(serde_json::from_value::<AddressListResponse>(body).is_err());
    }

    #[test]
    fn adapters_build_from_default_config() {
        let config = LookupConfig::default();
        assert!(ArcGisAddressLookup::new(&config).is_ok());
        assert!(UspsCarrierRouteLookup::new(&config).is_ok());
    }
}
