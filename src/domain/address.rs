use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{EnrichError, Result};

/// A postal address moving through the enrichment pipeline.
///
/// Equality and hashing cover the core fields only (street number, street name,
/// apartment number, city, state, zip). `carrier_route` is an annotation and is
/// ignored when comparing addresses.
#[derive(Debug, Clone, Serialize)]
pub struct Address {
    street_number: String,
    street_name: String,
    apt_number: Option<String>,
    city: String,
    state: String,
    zip: String,
    carrier_route: Option<String>,
}

impl Address {
    pub fn builder() -> AddressBuilder {
        AddressBuilder::default()
    }

    pub fn street_number(&self) -> &str {
        &self.street_number
    }

    pub fn street_name(&self) -> &str {
        &self.street_name
    }

    pub fn apt_number(&self) -> Option<&str> {
        self.apt_number.as_deref()
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn zip(&self) -> &str {
        &self.zip
    }

    pub fn carrier_route(&self) -> Option<&str> {
        self.carrier_route.as_deref()
    }

    /// The only in-place mutation an address supports.
    pub fn set_carrier_route(&mut self, route: impl Into<String>) {
        self.carrier_route = Some(route.into());
    }

    /// Street number and name, e.g. "123 Main St".
    pub fn line1(&self) -> String {
        format!("{} {}", self.street_number, self.street_name)
    }

    fn core_fields(&self) -> (&str, &str, Option<&str>, &str, &str, &str) {
        (
            &self.street_number,
            &self.street_name,
            self.apt_number.as_deref(),
            &self.city,
            &self.state,
            &self.zip,
        )
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.core_fields() == other.core_fields()
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.core_fields().hash(state);
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.line1())?;
        if let Some(apt) = &self.apt_number {
            write!(f, " apt #{}", apt)?;
        }
        write!(f, ", {}, {} {}", self.city, self.state, self.zip)
    }
}

/// Incremental builder for [`Address`].
///
/// Values are trimmed. Required fields that end up empty are treated as missing,
/// and an empty apartment number becomes `None`.
#[derive(Debug, Clone, Default)]
pub struct AddressBuilder {
    street_number: Option<String>,
    street_name: Option<String>,
    apt_number: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip: Option<String>,
    carrier_route: Option<String>,
}

impl AddressBuilder {
    pub fn street_number(mut self, value: impl Into<String>) -> Self {
        self.street_number = Some(value.into());
        self
    }

    pub fn street_name(mut self, value: impl Into<String>) -> Self {
        self.street_name = Some(value.into());
        self
    }

    pub fn apt_number(mut self, value: impl Into<String>) -> Self {
        self.apt_number = Some(value.into());
        self
    }

    pub fn city(mut self, value: impl Into<String>) -> Self {
        self.city = Some(value.into());
        self
    }

    pub fn state(mut self, value: impl Into<String>) -> Self {
        self.state = Some(value.into());
        self
    }

    pub fn zip(mut self, value: impl Into<String>) -> Self {
        self.zip = Some(value.into());
        self
    }

    pub fn carrier_route(mut self, value: impl Into<String>) -> Self {
        self.carrier_route = Some(value.into());
        self
    }

    pub fn build(self) -> Result<Address> {
        Ok(Address {
            street_number: required("street_number", self.street_number)?,
            street_name: required("street_name", self.street_name)?,
            apt_number: optional(self.apt_number),
            city: required("city", self.city)?,
            state: required("state", self.state)?,
            zip: required("zip", self.zip)?,
            carrier_route: optional(self.carrier_route),
        })
    }
}

fn required(field: &str, value: Option<String>) -> Result<String> {
    optional(value).ok_or_else(|| EnrichError::MissingField(field.to_string()))
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Loosely-typed address as uploaded by the host. Every field is optional here;
/// [`AddressRecord::into_address`] applies the builder rules.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressRecord {
    #[serde(default, deserialize_with = "string_or_number")]
    pub street_number: Option<String>,
    #[serde(default)]
    pub street_name: Option<String>,
    #[serde(default)]
    pub apt_number: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub zip: Option<String>,
}

impl AddressRecord {
    pub fn into_address(self) -> Result<Address> {
        let mut builder = Address::builder();
        if let Some(v) = self.street_number {
            builder = builder.street_number(v);
        }
        if let Some(v) = self.street_name {
            builder = builder.street_name(v);
        }
        if let Some(v) = self.apt_number {
            builder = builder.apt_number(v);
        }
        if let Some(v) = self.city {
            builder = builder.city(v);
        }
        if let Some(v) = self.state {
            builder = builder.state(v);
        }
        if let Some(v) = self.zip {
            builder = builder.zip(v);
        }
        builder.build()
    }
}

/// Accepts `"123"`, `123` or `null` and yields an optional string.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(s)) => Some(s),
        Some(Raw::Int(n)) => Some(n.to_string()),
        Some(Raw::Float(n)) => Some(n.to_string()),
        None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn main_st() -> AddressBuilder {
        Address::builder()
            .street_number("123")
            .street_name("Main St")
            .city("Springfield")
            .state("IL")
            .zip("62704")
    }

    #[test]
    fn builds_with_required_fields() {
        let address = main_st().build().unwrap();
        assert_eq!(address.street_number(), "123");
        assert_eq!(address.line1(), "123 Main St");
        assert!(address.apt_number().is_none());
        assert!(address.carrier_route().is_none());
    }

    #[test]
    fn missing_required_field_fails() {
        let err = Address::builder()
            .street_number("123")
            .street_name("Main St")
            .city("Springfield")
            .zip("62704")
            .build()
            .unwrap_err();
        assert!(matches!(err, EnrichError::MissingField(ref f) if f == "state"));
    }

    #[test]
    fn blank_required_field_counts_as_missing() {
        let err = main_st().city("   ").build().unwrap_err();
        assert!(matches!(err, EnrichError::MissingField(ref f) if f == "city"));
    }

    #[test]
    fn empty_apartment_becomes_none() {
        let with_empty = main_st().apt_number("").build().unwrap();
        let without = main_st().build().unwrap();
        assert!(with_empty.apt_number().is_none());
        assert_eq!(with_empty, without);
    }

    #[test]
    fn equality_ignores_carrier_route() {
        let plain = main_st().build().unwrap();
        let routed = main_st().carrier_route("C001").build().unwrap();
        assert_eq!(plain, routed);
    }

    #[test]
    fn equality_covers_apartment_number() {
        let a = main_st().apt_number("4B").build().unwrap();
        let b = main_st().apt_number("4C").build().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn serializes_in_stable_field_order() {
        let mut address = main_st().apt_number("2").build().unwrap();
        address.set_carrier_route("C001");
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(
            json,
            r#"{"street_number":"123","street_name":"Main St","apt_number":"2","city":"Springfield","state":"IL","zip":"62704","carrier_route":"C001"}"#
        );
    }

    #[test]
    fn unset_optionals_serialize_as_null() {
        let value = serde_json::to_value(main_st().build().unwrap()).unwrap();
        assert!(value["apt_number"].is_null());
        assert!(value["carrier_route"].is_null());
    }

    #[test]
    fn record_accepts_numeric_street_number_and_zip() {
        let record: AddressRecord = serde_json::from_value(json!({
            "street_number": 123,
            "street_name": "Main St",
            "city": "Springfield",
            "state": "IL",
            "zip": 62704
        }))
        .unwrap();
        let address = record.into_address().unwrap();
        assert_eq!(address.street_number(), "123");
        assert_eq!(address.zip(), "62704");
    }

    #[test]
    fn record_missing_street_name_fails() {
        let record: AddressRecord = serde_json::from_value(json!({
            "street_number": "1",
            "city": "Springfield",
            "state": "IL",
            "zip": "62704"
        }))
        .unwrap();
        assert!(matches!(record.into_address(), Err(EnrichError::MissingField(_))));
    }

    #[test]
    fn display_includes_apartment_token() {
        let address = main_st().apt_number("7").build().unwrap();
        assert_eq!(address.to_string(), "123 Main St apt #7, Springfield, IL 62704");
    }
}
