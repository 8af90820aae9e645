use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;

/// Per-request key/value store threaded through the layer chain.
///
/// A fresh state is created for every request and dropped with its context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestState {
    values: HashMap<String, Value>,
}

impl RequestState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, returning the previous value.
    pub fn insert<K: Into<String>, V: Into<Value>>(&mut self, key: K, value: V) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    /// Serializes `value` to JSON and stores it under `key`.
    pub fn insert_serialized<K: Into<String>, T: Serialize>(
        &mut self,
        key: K,
        value: &T,
    ) -> Result<Option<Value>, serde_json::Error> {
        Ok(self.insert(key, serde_json::to_value(value)?))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.values.get_mut(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Deserializes the value under `key`, `None` if it is missing or has another shape.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|value| T::deserialize(value).ok())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }
}
