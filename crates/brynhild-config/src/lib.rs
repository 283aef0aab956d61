//! Typed configuration surface: resolves `Settings` from constructor
//! overrides, process env, `.env`, project config, user config, and
//! bundled defaults, layered through a [`brynhild_dcm::DeepChainMap`].

mod error;
mod legacy;
mod project_root;
mod settings;
mod sources;

pub use error::{ConfigError, Result};
pub use legacy::{check_legacy_env_vars, LegacyMapping, LEGACY_ENV_VARS};
pub use project_root::find_project_root;
pub use settings::Settings;
