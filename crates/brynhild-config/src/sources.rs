//! Layer construction: turns the process environment, `.env` files, and
//! on-disk YAML config into the ordered set of layers the precedence chain
//! in [`crate::settings::Settings`] feeds into a `DeepChainMap`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use brynhild_dcm::DcmValue;

use crate::error::{ConfigError, Result};

pub const ENV_PREFIX: &str = "BRYNHILD_";
pub const NESTED_DELIMITER: &str = "__";

/// Builds a `DcmValue::Mapping` from every `BRYNHILD_`-prefixed process
/// environment variable, splitting `__`-delimited names into nested keys
/// (`BRYNHILD_BEHAVIOR__MAX_TOKENS` -> `behavior.max_tokens`).
pub fn env_layer() -> DcmValue {
    layer_from_pairs(std::env::vars())
}

/// Same nesting/coercion rules as [`env_layer`], but over an arbitrary
/// iterator of key/value pairs — used to fold a `.env` file in as its own
/// layer without mutating the process environment.
pub fn layer_from_pairs(pairs: impl Iterator<Item = (String, String)>) -> DcmValue {
    let mut root: BTreeMap<String, DcmValue> = BTreeMap::new();
    for (key, value) in pairs {
        let Some(rest) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let segments: Vec<String> = rest
            .split(NESTED_DELIMITER)
            .map(|s| s.to_lowercase())
            .collect();
        insert_nested(&mut root, &segments, coerce_env_value(&value));
    }
    DcmValue::Mapping(root)
}

fn insert_nested(root: &mut BTreeMap<String, DcmValue>, segments: &[String], value: DcmValue) {
    match segments.split_first() {
        None => {}
        Some((key, [])) => {
            root.insert(key.clone(), value);
        }
        Some((key, rest)) => {
            let entry = root
                .entry(key.clone())
                .or_insert_with(|| DcmValue::Mapping(BTreeMap::new()));
            if let DcmValue::Mapping(nested) = entry {
                insert_nested(nested, rest, value);
            } else {
                *entry = DcmValue::Mapping(BTreeMap::new());
                if let DcmValue::Mapping(nested) = entry {
                    insert_nested(nested, rest, value);
                }
            }
        }
    }
}

/// Best-effort scalar coercion for raw env var strings: `true`/`false`
/// become booleans, integers and floats parse as numbers, everything else
/// stays a string. Comma-separated values become a sequence, matching how
/// list-valued settings like `disabled_tools` are passed on the CLI.
fn coerce_env_value(raw: &str) -> DcmValue {
    if let Ok(b) = raw.parse::<bool>() {
        return DcmValue::Bool(b);
    }
    if let Ok(i) = raw.parse::<i64>() {
        return DcmValue::Number(i.into());
    }
    if let Ok(f) = raw.parse::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return DcmValue::Number(n);
        }
    }
    if raw.contains(',') {
        let items = raw
            .split(',')
            .map(|s| DcmValue::String(s.trim().to_string()))
            .collect();
        return DcmValue::Sequence(items);
    }
    DcmValue::String(raw.to_string())
}

/// Resolves the `.env` file to load: `BRYNHILD_ENV_FILE` override, else
/// `<project_root>/.env` if present, else `None`.
pub fn find_env_file(project_root: &Path) -> Option<PathBuf> {
    if let Ok(path) = std::env::var("BRYNHILD_ENV_FILE") {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }
    let default = project_root.join(".env");
    default.exists().then_some(default)
}

/// Platform-appropriate user config directory (`~/.config/brynhild` on
/// Unix-likes).
pub fn user_config_dir() -> PathBuf {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("brynhild")
}

/// Loads a YAML layer from disk, returning `Ok(None)` if the file does not
/// exist (an absent config layer is not an error).
pub fn load_yaml_file(path: &Path) -> Result<Option<DcmValue>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(Some(DcmValue::from_yaml_str(&contents)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerces_bool_and_number() {
        assert_eq!(coerce_env_value("true"), DcmValue::Bool(true));
        assert_eq!(coerce_env_value("42"), DcmValue::Number(42.into()));
        assert_eq!(
            coerce_env_value("plain"),
            DcmValue::String("plain".to_string())
        );
    }

    #[test]
    fn nested_delimiter_builds_mapping() {
        std::env::set_var("BRYNHILD_BEHAVIOR__MAX_TOKENS", "8192");
        let layer = env_layer();
        std::env::remove_var("BRYNHILD_BEHAVIOR__MAX_TOKENS");
        let behavior = layer.as_mapping().unwrap().get("behavior").unwrap();
        assert_eq!(
            behavior.as_mapping().unwrap().get("max_tokens"),
            Some(&DcmValue::Number(8192.into()))
        );
    }
}
