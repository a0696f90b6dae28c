use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::address::{string_or_number, Address};
use crate::error::Result;

// Address-candidate lookup

#[async_trait]
pub trait AddressLookupPort: Send + Sync {
    /// Returns candidates for a single free-form address line, best match first.
    async fn find_candidates(&self, single_line: &str) -> Result<Vec<AddressCandidate>>;
}

/// A proposed match from the address-candidate lookup. Consumed immediately,
/// never stored.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressCandidate {
    pub attributes: CandidateAttributes,
}

/// The candidate attributes the validation stage consumes. Every key must be
/// present; values may be null.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateAttributes {
    #[serde(rename = "AddNum", deserialize_with = "string_or_number")]
    pub add_num: Option<String>,
    #[serde(rename = "StName", deserialize_with = "string_or_number")]
    pub st_name: Option<String>,
    #[serde(rename = "StType", deserialize_with = "string_or_number")]
    pub st_type: Option<String>,
    #[serde(rename = "SubAddr", deserialize_with = "string_or_number")]
    pub sub_addr: Option<String>,
    #[serde(rename = "City", deserialize_with = "string_or_number")]
    pub city: Option<String>,
    #[serde(rename = "RegionAbbr", deserialize_with = "string_or_number")]
    pub region_abbr: Option<String>,
    #[serde(rename = "Postal", deserialize_with = "string_or_number")]
    pub postal: Option<String>,
}

// Carrier-route lookup

#[async_trait]
pub trait CarrierRoutePort: Send + Sync {
    /// Returns the address list for a request, in service order.
    async fn lookup(&self, request: &CarrierRouteRequest) -> Result<Vec<CarrierRouteCandidate>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarrierRouteRequest {
    pub address1: String,
    pub address2: String,
    pub city: String,
    pub state: String,
    pub urban_code: String,
    pub zip: String,
}

impl CarrierRouteRequest {
    pub fn from_address(address: &Address) -> Self {
        Self {
            address1: address.line1(),
            address2: address.apt_number().unwrap_or_default().to_string(),
            city: address.city().to_string(),
            state: address.state().to_string(),
            urban_code: String::new(),
            zip: address.zip().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CarrierRouteCandidate {
    /// Null and absent are both treated as "no route".
    #[serde(rename = "carrierRoute", default)]
    pub carrier_route: Option<String>,
}

// Storage

#[async_trait]
pub trait StoragePort: Send + Sync {
    /// Writes `bytes` to `path`, replacing anything already there.
    async fn write(&self, bytes: Vec<u8>, path: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn carrier_request_uses_empty_string_for_missing_apartment() {
        let address = Address::builder()
            .street_number("123")
            .street_name("Main St")
            .city("Springfield")
            .state("IL")
            .zip("62704")
            .build()
            .unwrap();

        let request = CarrierRouteRequest::from_address(&address);
        assert_eq!(request.address1, "123 Main St");
        assert_eq!(request.address2, "");
        assert_eq!(request.urban_code, "");

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["urbanCode"], json!(""));
        assert_eq!(value["address2"], json!(""));
    }

    #[test]
    fn candidate_attributes_require_every_key() {
        let missing_postal = json!({
            "attributes": {
                "AddNum": "123", "StName": "Main", "StType": "St", "SubAddr": "",
                "City": "Springfield", "RegionAbbr": "IL"
            }
        });
        assert!(serde_json::from_value::<AddressCandidate>(missing_postal).is_err());
    }

    #[test]
    fn candidate_attributes_accept_numeric_house_number() {
        let candidate: AddressCandidate = serde_json::from_value(json!({
            "attributes": {
                "AddNum": 123, "StName": "Main", "StType": "St", "SubAddr": null,
                "City": "Springfield", "RegionAbbr": "IL", "Postal": "62704"
            }
        }))
        .unwrap();
        assert_eq!(candidate.attributes.add_num.as_deref(), Some("123"));
        assert!(candidate.attributes.sub_addr.is_none());
    }

    #[test]
    fn carrier_candidate_tolerates_null_route() {
        let candidate: CarrierRouteCandidate =
            serde_json::from_value(json!({ "carrierRoute": null })).unwrap();
        assert!(candidate.carrier_route.is_none());
    }
}
