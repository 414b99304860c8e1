//! Record assembly for the document store

use anyhow::Context;
use serde_json::{Map, Value, json};

use crate::normalize;

/// One unit of work: fetch and persist a single destination's hotel data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub country_code: String,
    pub destination_id: String,
}

impl std::fmt::Display for WorkItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "destination {} ({})", self.destination_id, self.country_code)
    }
}

/// Shape the raw hotel detail body into the stored document.
///
/// The embedded `HotelData` XML string becomes a JSON tree, the document
/// gets its `HotelId`, and the session token is stripped so credentials
/// never reach the store.
pub fn build_record(mut raw: Map<String, Value>, item: &WorkItem) -> anyhow::Result<Value> {
    let hotel_data = match raw.remove("HotelData") {
        Some(Value::String(xml)) => normalize::normalize(&xml)
            .with_context(|| format!("normalizing hotel data for {item}"))?,
        // Missing or non-string payload stores as an empty object
        _ => json!({}),
    };
    raw.insert("HotelData".to_string(), hotel_data);
    raw.insert(
        "HotelId".to_string(),
        Value::String(item.destination_id.clone()),
    );
    raw.remove("TokenId");
    Ok(Value::Object(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> WorkItem {
        WorkItem {
            country_code: "AE".to_string(),
            destination_id: "115936".to_string(),
        }
    }

    fn raw(hotel_data: Value) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("Status".to_string(), json!(1));
        map.insert("TokenId".to_string(), json!("secret-token"));
        map.insert("HotelName".to_string(), json!("Test Hotel"));
        map.insert("HotelData".to_string(), hotel_data);
        map
    }

    #[test]
    fn xml_payload_normalized_in_place() {
        let record = build_record(raw(json!("<Hotel><Name>Atlantis</Name></Hotel>")), &item())
            .unwrap();
        assert_eq!(record["HotelData"]["Hotel"]["Name"]["text"], "Atlantis");
        assert_eq!(record["HotelName"], "Test Hotel");
    }

    #[test]
    fn hotel_id_set_from_destination() {
        let record = build_record(raw(json!("<Hotel/>")), &item()).unwrap();
        assert_eq!(record["HotelId"], "115936");
    }

    #[test]
    fn token_stripped_from_record() {
        let record = build_record(raw(json!("<Hotel/>")), &item()).unwrap();
        assert!(record.get("TokenId").is_none());
    }

    #[test]
    fn missing_hotel_data_becomes_empty_object() {
        let mut map = Map::new();
        map.insert("Status".to_string(), json!(1));
        let record = build_record(map, &item()).unwrap();
        assert_eq!(record["HotelData"], json!({}));
    }

    #[test]
    fn malformed_xml_fails_the_item() {
        let err = build_record(raw(json!("<Hotel><Oops></Hotel>")), &item()).unwrap_err();
        assert!(format!("{err:#}").contains("destination 115936 (AE)"));
    }

    #[test]
    fn display_names_destination_and_country() {
        assert_eq!(format!("{}", item()), "destination 115936 (AE)");
    }
}
