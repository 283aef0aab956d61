//! Typed view over a `DeepChainMap` assembled from the full precedence
//! chain: constructor overrides, process env, `.env` file, project config,
//! user config, bundled defaults.

use std::path::{Path, PathBuf};

use brynhild_dcm::{DcmValue, DeepChainMap};

use crate::error::{ConfigError, Result};
use crate::legacy;
use crate::project_root::find_project_root;
use crate::sources::{self, ENV_PREFIX};

const PROJECT_CONFIG_FILENAME: &str = ".brynhild.yaml";
const USER_CONFIG_FILENAME: &str = "config.yaml";

/// Set to bypass the fatal legacy-env-var check (see
/// `legacy::check_legacy_env_vars`) when a caller needs to run with an old
/// env layout present, e.g. mid-migration.
const SKIP_MIGRATION_CHECK_ENV: &str = "BRYNHILD_SKIP_MIGRATION_CHECK";

/// Bundled fallback values, lowest priority of all. Kept intentionally
/// small — only the handful of settings the rest of the system assumes
/// are always present get a default here.
const BUNDLED_DEFAULTS_YAML: &str = r#"
models:
  default: claude-sonnet-4-5
providers:
  default: anthropic
behavior:
  max_tokens: 8192
  verbose: false
  output_format: text
sandbox:
  enabled: true
  allow_network: false
logging:
  enabled: true
  private: false
  raw_payloads: false
tools:
  disabled: []
"#;

/// Typed settings resolved from every configuration source.
#[derive(Debug)]
pub struct Settings {
    dcm: DeepChainMap,
    project_root: PathBuf,
}

impl Settings {
    /// Resolves the full precedence chain and returns a ready-to-use
    /// `Settings`. `overrides` become the front (highest-priority) layer;
    /// pass an empty mapping for CLI-less callers.
    pub fn load(overrides: DcmValue, allow_home_directory: bool) -> Result<Settings> {
        Self::load_from(None, overrides, allow_home_directory)
    }

    /// Like [`Settings::load`], but resolves the project root starting
    /// from `start_dir` instead of the process cwd — primarily for tests.
    pub fn load_from(
        start_dir: Option<&Path>,
        overrides: DcmValue,
        allow_home_directory: bool,
    ) -> Result<Settings> {
        let project_root = find_project_root(start_dir, allow_home_directory)?;

        let legacy_hits = legacy::check_legacy_env_vars();
        if !legacy_hits.is_empty() && std::env::var_os(SKIP_MIGRATION_CHECK_ENV).is_none() {
            for hit in &legacy_hits {
                tracing::warn!(old = hit.old, new = hit.new, "legacy env var is deprecated");
            }
            return Err(ConfigError::LegacyEnvVar(legacy_hits));
        }

        let mut dcm = DeepChainMap::new(true);

        // Lowest priority first: bundled defaults, user config, project
        // config, .env file, process env. The front layer (overrides) is
        // applied last and always wins.
        dcm.add_layer(DcmValue::from_yaml_str(BUNDLED_DEFAULTS_YAML)?)?;

        let user_config_path = sources::user_config_dir().join(USER_CONFIG_FILENAME);
        if let Some(layer) = sources::load_yaml_file(&user_config_path)? {
            dcm.add_layer(layer)?;
        }

        let project_config_path = project_root.join(PROJECT_CONFIG_FILENAME);
        if let Some(layer) = sources::load_yaml_file(&project_config_path)? {
            dcm.add_layer(layer)?;
        }

        if let Some(env_file) = sources::find_env_file(&project_root) {
            if let Ok(iter) = dotenvy::from_path_iter(&env_file) {
                let pairs = iter.filter_map(|r| r.ok());
                dcm.add_layer(sources::layer_from_pairs(pairs))?;
            }
        }

        dcm.add_layer(sources::env_layer())?;

        if let DcmValue::Mapping(entries) = overrides {
            for (key, value) in entries {
                dcm.set(&[key.as_str()], value)?;
            }
        }

        Ok(Settings { dcm, project_root })
    }

    /// Direct read-through access to the underlying map, for callers that
    /// need a setting this typed surface does not expose yet.
    pub fn raw(&self) -> &DeepChainMap {
        &self.dcm
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn config_dir(&self) -> PathBuf {
        sources::user_config_dir()
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.config_dir().join("sessions")
    }

    pub fn logs_dir(&self) -> PathBuf {
        let username = whoami_fallback();
        std::env::temp_dir().join(format!("brynhild-logs-{username}"))
    }

    fn string_at(&self, path: &[&str], default: &str) -> String {
        self.dcm
            .get(path)
            .ok()
            .and_then(|v| match v {
                DcmValue::String(s) => Some(s),
                _ => None,
            })
            .unwrap_or_else(|| default.to_string())
    }

    fn bool_at(&self, path: &[&str], default: bool) -> bool {
        self.dcm
            .get(path)
            .ok()
            .and_then(|v| match v {
                DcmValue::Bool(b) => Some(b),
                _ => None,
            })
            .unwrap_or(default)
    }

    fn u64_at(&self, path: &[&str], default: u64) -> u64 {
        self.dcm
            .get(path)
            .ok()
            .and_then(|v| match v {
                DcmValue::Number(n) => n.as_u64(),
                _ => None,
            })
            .unwrap_or(default)
    }

    pub fn model(&self) -> String {
        self.string_at(&["models", "default"], "claude-sonnet-4-5")
    }

    pub fn provider(&self) -> String {
        self.string_at(&["providers", "default"], "anthropic")
    }

    pub fn max_tokens(&self) -> u64 {
        self.u64_at(&["behavior", "max_tokens"], 8192)
    }

    pub fn verbose(&self) -> bool {
        self.bool_at(&["behavior", "verbose"], false)
    }

    pub fn output_format(&self) -> String {
        self.string_at(&["behavior", "output_format"], "text")
    }

    pub fn sandbox_enabled(&self) -> bool {
        self.bool_at(&["sandbox", "enabled"], true)
    }

    pub fn sandbox_allow_network(&self) -> bool {
        self.bool_at(&["sandbox", "allow_network"], false)
    }

    pub fn allowed_paths(&self) -> Vec<String> {
        self.dcm
            .get(&["sandbox", "allowed_paths"])
            .ok()
            .and_then(|v| v.as_sequence().cloned())
            .map(|items| {
                items
                    .into_iter()
                    .filter_map(|v| match v {
                        DcmValue::String(s) => Some(s),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn log_conversations(&self) -> bool {
        self.bool_at(&["logging", "enabled"], true)
    }

    pub fn log_dir_private(&self) -> bool {
        self.bool_at(&["logging", "private"], false)
    }

    pub fn raw_log(&self) -> bool {
        self.bool_at(&["logging", "raw_payloads"], false)
    }

    pub fn disabled_tools(&self) -> Vec<String> {
        self.dcm
            .get(&["tools", "disabled"])
            .ok()
            .and_then(|v| v.as_sequence().cloned())
            .map(|items| {
                items
                    .into_iter()
                    .filter_map(|v| match v {
                        DcmValue::String(s) => Some(s),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_tool_disabled(&self, name: &str) -> bool {
        self.disabled_tools().iter().any(|t| t == name)
    }

    /// Looks up `{PROVIDER}_API_KEY` in the environment (e.g.
    /// `ANTHROPIC_API_KEY`), falling back to a `providers.<name>.api_key`
    /// config entry.
    pub fn get_api_key(&self, provider: &str) -> Result<String> {
        let env_name = format!("{}_API_KEY", provider.to_uppercase());
        if let Ok(key) = std::env::var(&env_name) {
            return Ok(key);
        }
        match self.dcm.get(&["providers", provider, "api_key"]) {
            Ok(DcmValue::String(s)) => Ok(s),
            _ => Err(ConfigError::MissingApiKey {
                provider: provider.to_string(),
            }),
        }
    }

    pub fn to_dict(&self) -> serde_json::Value {
        self.dcm.to_dict()
    }
}

fn whoami_fallback() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

#[allow(dead_code)]
fn env_prefix_note() -> &'static str {
    ENV_PREFIX
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_defaults_apply_when_nothing_else_set() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(
            Some(tmp.path()),
            DcmValue::Mapping(Default::default()),
            true,
        )
        .unwrap();
        assert_eq!(settings.model(), "claude-sonnet-4-5");
        assert_eq!(settings.max_tokens(), 8192);
    }

    #[test]
    fn constructor_overrides_win_over_everything() {
        let tmp = tempfile::tempdir().unwrap();
        let overrides = DcmValue::mapping([(
            "models".to_string(),
            DcmValue::mapping([("default".to_string(), DcmValue::String("gpt-5".into()))]),
        )]);
        let settings = Settings::load_from(Some(tmp.path()), overrides, true).unwrap();
        assert_eq!(settings.model(), "gpt-5");
    }
}
