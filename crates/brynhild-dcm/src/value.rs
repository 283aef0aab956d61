//! The value type stored in DCM layers, plus YAML loading with the
//! `!delete` and `!replace` marker tags.

use std::collections::BTreeMap;

use crate::error::{DcmError, Result};

/// A value held by a DCM layer.
///
/// Mirrors a JSON/YAML value with two extra tombstone/override variants:
/// [`DcmValue::Delete`] (the `!delete` tag) and [`DcmValue::Replace`] (the
/// `!replace` tag).
#[derive(Debug, Clone, PartialEq)]
pub enum DcmValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Sequence(Vec<DcmValue>),
    Mapping(BTreeMap<String, DcmValue>),
    /// Tombstone marker: masks the same path in every lower-priority layer.
    Delete,
    /// Disables deep-merge at this path; the wrapped value is used exactly.
    Replace(Box<DcmValue>),
}

impl DcmValue {
    pub fn mapping(entries: impl IntoIterator<Item = (String, DcmValue)>) -> Self {
        DcmValue::Mapping(entries.into_iter().collect())
    }

    pub fn as_mapping(&self) -> Option<&BTreeMap<String, DcmValue>> {
        match self {
            DcmValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut BTreeMap<String, DcmValue>> {
        match self {
            DcmValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Vec<DcmValue>> {
        match self {
            DcmValue::Sequence(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence_mut(&mut self) -> Option<&mut Vec<DcmValue>> {
        match self {
            DcmValue::Sequence(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, DcmValue::Mapping(_))
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, DcmValue::Delete)
    }

    /// Parse a full YAML document into a top-level mapping, recognizing
    /// `!delete` and `!replace` tags anywhere in the tree.
    pub fn from_yaml_str(source: &str) -> Result<DcmValue> {
        let raw: serde_yaml::Value = serde_yaml::from_str(source)?;
        let value = from_yaml_value(raw);
        if !value.is_mapping() {
            return Err(DcmError::NotATopLevelMapping(
                "expected a YAML mapping at the document root".into(),
            ));
        }
        Ok(value)
    }

    /// Convert to a plain `serde_json::Value`, dropping DCM markers.
    /// `Delete` becomes `Null`; `Replace(v)` unwraps to `v`. Used for
    /// `to_dict()`/JSON export once a value has already been merged (no
    /// markers should remain in a fully-merged result, but this stays
    /// total for partial/debug dumps).
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            DcmValue::Null => serde_json::Value::Null,
            DcmValue::Bool(b) => serde_json::Value::Bool(*b),
            DcmValue::Number(n) => serde_json::Value::Number(n.clone()),
            DcmValue::String(s) => serde_json::Value::String(s.clone()),
            DcmValue::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(DcmValue::to_json).collect())
            }
            DcmValue::Mapping(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            DcmValue::Delete => serde_json::Value::Null,
            DcmValue::Replace(inner) => inner.to_json(),
        }
    }
}

impl From<serde_json::Value> for DcmValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => DcmValue::Null,
            serde_json::Value::Bool(b) => DcmValue::Bool(b),
            serde_json::Value::Number(n) => DcmValue::Number(n),
            serde_json::Value::String(s) => DcmValue::String(s),
            serde_json::Value::Array(items) => {
                DcmValue::Sequence(items.into_iter().map(DcmValue::from).collect())
            }
            serde_json::Value::Object(entries) => DcmValue::Mapping(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, DcmValue::from(v)))
                    .collect(),
            ),
        }
    }
}

fn from_yaml_value(value: serde_yaml::Value) -> DcmValue {
    match value {
        serde_yaml::Value::Null => DcmValue::Null,
        serde_yaml::Value::Bool(b) => DcmValue::Bool(b),
        serde_yaml::Value::Number(n) => {
            let json_num = if let Some(i) = n.as_i64() {
                serde_json::Number::from(i)
            } else if let Some(u) = n.as_u64() {
                serde_json::Number::from(u)
            } else {
                serde_json::Number::from_f64(n.as_f64().unwrap_or(0.0))
                    .unwrap_or_else(|| serde_json::Number::from(0))
            };
            DcmValue::Number(json_num)
        }
        serde_yaml::Value::String(s) => DcmValue::String(s),
        serde_yaml::Value::Sequence(items) => {
            DcmValue::Sequence(items.into_iter().map(from_yaml_value).collect())
        }
        serde_yaml::Value::Mapping(entries) => DcmValue::Mapping(
            entries
                .into_iter()
                .filter_map(|(k, v)| {
                    k.as_str()
                        .map(|key| (key.to_string(), from_yaml_value(v)))
                })
                .collect(),
        ),
        serde_yaml::Value::Tagged(tagged) => {
            let tag = tagged.tag.to_string();
            // serde_yaml renders custom tags as "!delete" / "!replace".
            if tag == "!delete" {
                DcmValue::Delete
            } else if tag == "!replace" {
                DcmValue::Replace(Box::new(from_yaml_value(tagged.value)))
            } else {
                from_yaml_value(tagged.value)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_mapping() {
        let v = DcmValue::from_yaml_str("behavior:\n  max_tokens: 8192\n").unwrap();
        let map = v.as_mapping().unwrap();
        let behavior = map.get("behavior").unwrap().as_mapping().unwrap();
        assert_eq!(
            behavior.get("max_tokens"),
            Some(&DcmValue::Number(serde_json::Number::from(8192)))
        );
    }

    #[test]
    fn parses_delete_tag() {
        let v = DcmValue::from_yaml_str("behavior:\n  verbose: !delete\n").unwrap();
        let behavior = v
            .as_mapping()
            .unwrap()
            .get("behavior")
            .unwrap()
            .as_mapping()
            .unwrap();
        assert_eq!(behavior.get("verbose"), Some(&DcmValue::Delete));
    }

    #[test]
    fn parses_replace_tag() {
        let v = DcmValue::from_yaml_str("tools: !replace\n  disabled: {}\n").unwrap();
        match v.as_mapping().unwrap().get("tools").unwrap() {
            DcmValue::Replace(inner) => assert!(inner.is_mapping()),
            other => panic!("expected Replace, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_mapping_top_level() {
        let err = DcmValue::from_yaml_str("- 1\n- 2\n").unwrap_err();
        assert!(matches!(err, DcmError::NotATopLevelMapping(_)));
    }
}
