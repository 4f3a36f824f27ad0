//! JSON codec settings and the case-insensitive reader.
//!
//! # Design
//! serde matches struct fields by exact name. Servers that emit `StatusCode`
//! where a DTO declares `statusCode` would fail, so reads go through
//! `CaseInsensitive`, a `Deserializer` over `serde_json::Value` that rewrites
//! object keys to the field names the target struct asks for. Write-side
//! naming is declared on the DTO itself with `#[serde(rename_all = "camelCase")]`.

use serde::de::{self, DeserializeOwned, DeserializeSeed, IntoDeserializer, Visitor};
use serde::{forward_to_deserialize_any, Serialize};
use serde_json::{Map, Value};

/// Codec options shared by every call a client makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonSettings {
    /// Match incoming property names to struct fields ignoring ASCII case.
    pub property_name_case_insensitive: bool,
}

impl Default for JsonSettings {
    fn default() -> Self {
        Self {
            property_name_case_insensitive: true,
        }
    }
}

impl JsonSettings {
    pub fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, serde_json::Error> {
        serde_json::to_string(value)
    }

    /// Deserialize a response body.
    ///
    /// An empty or whitespace-only body yields `T::default()`.
    pub fn deserialize<T: DeserializeOwned + Default>(
        &self,
        body: &[u8],
    ) -> Result<T, serde_json::Error> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(T::default());
        }
        self.deserialize_strict(body)
    }

    /// Deserialize without the empty-body fallback.
    pub fn deserialize_strict<T: DeserializeOwned>(
        &self,
        body: &[u8],
    ) -> Result<T, serde_json::Error> {
        if self.property_name_case_insensitive {
            let value: Value = serde_json::from_slice(body)?;
            T::deserialize(CaseInsensitive(value))
        } else {
            serde_json::from_slice(body)
        }
    }
}

/// Deserializer that matches struct field names ignoring ASCII case.
///
/// Applies at every nesting level reached through structs, sequences, maps and
/// options. Enum payloads are handed to `serde_json` unchanged.
pub struct CaseInsensitive(pub Value);

impl<'de> de::Deserializer<'de> for CaseInsensitive {
    type Error = serde_json::Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Array(items) => visitor.visit_seq(SeqAccess {
                iter: items.into_iter(),
            }),
            Value::Object(map) => visitor.visit_map(MapAccess::new(map)),
            other => other.deserialize_any(visitor),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Null => visitor.visit_none(),
            value => visitor.visit_some(CaseInsensitive(value)),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Object(map) => visitor.visit_map(MapAccess::new(match_field_names(map, fields))),
            other => other.deserialize_struct(name, fields, visitor),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.0.deserialize_enum(name, variants, visitor)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map identifier
        ignored_any
    }
}

/// Rename keys that differ from a declared field only by case.
///
/// A key that already matches a field exactly is never displaced.
fn match_field_names(map: Map<String, Value>, fields: &[&str]) -> Map<String, Value> {
    let exact: Vec<&str> = fields
        .iter()
        .copied()
        .filter(|field| map.contains_key(*field))
        .collect();
    map.into_iter()
        .map(|(key, value)| {
            if fields.contains(&key.as_str()) {
                return (key, value);
            }
            let renamed = fields
                .iter()
                .find(|field| field.eq_ignore_ascii_case(&key) && !exact.contains(field))
                .map(|field| field.to_string())
                .unwrap_or(key);
            (renamed, value)
        })
        .collect()
}

struct SeqAccess {
    iter: std::vec::IntoIter<Value>,
}

impl<'de> de::SeqAccess<'de> for SeqAccess {
    type Error = serde_json::Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, Self::Error> {
        self.iter
            .next()
            .map(|value| seed.deserialize(CaseInsensitive(value)))
            .transpose()
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapAccess {
    iter: serde_json::map::IntoIter,
    value: Option<Value>,
}

impl MapAccess {
    fn new(map: Map<String, Value>) -> Self {
        Self {
            iter: map.into_iter(),
            value: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for MapAccess {
    type Error = serde_json::Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, Self::Error> {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                let key: de::value::StringDeserializer<serde_json::Error> = key.into_deserializer();
                seed.deserialize(key).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(
        &mut self,
        seed: V,
    ) -> Result<V::Value, Self::Error> {
        match self.value.take() {
            Some(value) => seed.deserialize(CaseInsensitive(value)),
            None => Err(de::Error::custom("value is missing")),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Default, PartialEq, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Order {
        order_id: u32,
        customer: Customer,
        lines: Vec<Line>,
        note: Option<Customer>,
    }

    #[derive(Debug, Default, PartialEq, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Customer {
        display_name: String,
    }

    #[derive(Debug, PartialEq, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Line {
        unit_price: f64,
        state: State,
    }

    #[derive(Debug, PartialEq, Deserialize)]
    #[serde(rename_all = "camelCase")]
    enum State {
        Open,
        Shipped,
    }

    #[test]
    fn matches_fields_ignoring_case_at_every_level() {
        let body = br#"{
            "OrderId": 7,
            "CUSTOMER": {"DisplayName": "Ada"},
            "Lines": [{"UnitPrice": 2, "state": "shipped"}],
            "note": {"displayname": "gift"}
        }"#;
        let order: Order = JsonSettings::default().deserialize(body).unwrap();
        assert_eq!(order.order_id, 7);
        assert_eq!(order.customer.display_name, "Ada");
        assert_eq!(order.lines, vec![Line { unit_price: 2.0, state: State::Shipped }]);
        assert_eq!(order.note.unwrap().display_name, "gift");
    }

    #[test]
    fn exact_key_wins_over_case_variant() {
        let body = br#"{"displayName": "exact", "DisplayName": "variant"}"#;
        let customer: Customer = JsonSettings::default().deserialize(body).unwrap();
        assert_eq!(customer.display_name, "exact");
    }

    #[test]
    fn case_sensitive_settings_reject_mismatched_names() {
        let settings = JsonSettings {
            property_name_case_insensitive: false,
        };
        let result: Result<Customer, _> = settings.deserialize(br#"{"DisplayName": "Ada"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn map_keys_are_left_alone() {
        let body = br#"{"Alpha": 1, "beta": 2}"#;
        let map: HashMap<String, u8> = JsonSettings::default().deserialize(body).unwrap();
        assert_eq!(map["Alpha"], 1);
        assert_eq!(map["beta"], 2);
    }

    #[test]
    fn blank_body_yields_default() {
        let settings = JsonSettings::default();
        let order: Order = settings.deserialize(b"  \n\t").unwrap();
        assert_eq!(order, Order::default());
        let items: Vec<u8> = settings.deserialize(b"").unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn malformed_body_is_an_error() {
        let result: Result<Customer, _> = JsonSettings::default().deserialize(b"{not json");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let customer: Customer = JsonSettings::default()
            .deserialize(br#"{"displayName": "Ada", "extra": [1, 2]}"#)
            .unwrap();
        assert_eq!(customer.display_name, "Ada");
    }
}
