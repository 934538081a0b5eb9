//! Typed access to the `components` list carried by skills and items.
//!
//! The engine stores components as `[name, value]` pairs where `value` is
//! `null` for flag components. Accessors here return a [`ComponentError`]
//! when a component exists with the wrong shape, so records can be rejected
//! at load time rather than misread later.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("component `{key}` should be {expected}")]
pub struct ComponentError {
    pub key: String,
    pub expected: &'static str,
}

impl ComponentError {
    fn new(key: &str, expected: &'static str) -> Self {
        Self {
            key: key.to_string(),
            expected,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Components(Vec<(String, Value)>);

impl Components {
    fn find(&self, key: &str) -> Option<&Value> {
        self.0
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    /// Presence check for flag components, whatever value they carry.
    pub fn has(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    pub fn string(&self, key: &str) -> Result<Option<&str>, ComponentError> {
        match self.find(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(ComponentError::new(key, "a string")),
        }
    }

    pub fn int(&self, key: &str) -> Result<i64, ComponentError> {
        match self.find(key) {
            None | Some(Value::Null) => Ok(0),
            Some(value) => value
                .as_i64()
                .ok_or_else(|| ComponentError::new(key, "an integer")),
        }
    }

    pub fn string_list(&self, key: &str) -> Result<Vec<String>, ComponentError> {
        match self.find(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(values)) => values
                .iter()
                .map(|value| {
                    value
                        .as_str()
                        .map(str::to_string)
                        .ok_or_else(|| ComponentError::new(key, "a list of strings"))
                })
                .collect(),
            Some(_) => Err(ComponentError::new(key, "a list of strings")),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn components(json: &str) -> Components {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn missing_components_fall_back_to_empty_values() {
        let comps = components("[]");
        assert_eq!(comps.string("weapon_type"), Ok(None));
        assert_eq!(comps.int("damage"), Ok(0));
        assert_eq!(comps.string_list("multi_item"), Ok(vec![]));
        assert!(!comps.has("usable"));
    }

    #[test]
    fn flag_components_have_null_values() {
        let comps = components(r#"[["usable", null], ["weapon_type", "Sword"]]"#);
        assert!(comps.has("usable"));
        assert_eq!(comps.string("weapon_type"), Ok(Some("Sword")));
        assert_eq!(comps.names().collect::<Vec<_>>(), vec!["usable", "weapon_type"]);
    }

    #[test]
    fn wrong_shapes_are_reported() {
        let comps = components(r#"[["damage", "5"], ["multi_item", ["A", 3]]]"#);
        assert_eq!(
            comps.int("damage"),
            Err(ComponentError::new("damage", "an integer"))
        );
        assert!(comps.string_list("multi_item").is_err());
    }
}
