//! Detection of legacy flat `BRYNHILD_*` environment variables so users
//! migrating from an older config layout get a pointed warning instead of
//! a silently-ignored setting.

/// One old-name/new-name pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegacyMapping {
    pub old: &'static str,
    pub new: &'static str,
}

/// Exhaustive list of flat env vars that were folded into nested
/// `section__key` form.
pub const LEGACY_ENV_VARS: &[LegacyMapping] = &[
    LegacyMapping { old: "BRYNHILD_MODEL", new: "BRYNHILD_MODELS__DEFAULT" },
    LegacyMapping { old: "BRYNHILD_PROVIDER", new: "BRYNHILD_PROVIDERS__DEFAULT" },
    LegacyMapping { old: "BRYNHILD_VERBOSE", new: "BRYNHILD_BEHAVIOR__VERBOSE" },
    LegacyMapping { old: "BRYNHILD_MAX_TOKENS", new: "BRYNHILD_BEHAVIOR__MAX_TOKENS" },
    LegacyMapping { old: "BRYNHILD_OUTPUT_FORMAT", new: "BRYNHILD_BEHAVIOR__OUTPUT_FORMAT" },
    LegacyMapping { old: "BRYNHILD_SANDBOX_ENABLED", new: "BRYNHILD_SANDBOX__ENABLED" },
    LegacyMapping { old: "BRYNHILD_SANDBOX_ALLOW_NETWORK", new: "BRYNHILD_SANDBOX__ALLOW_NETWORK" },
    LegacyMapping { old: "BRYNHILD_LOG_CONVERSATIONS", new: "BRYNHILD_LOGGING__ENABLED" },
    LegacyMapping { old: "BRYNHILD_LOG_DIR", new: "BRYNHILD_LOGGING__DIR" },
    LegacyMapping { old: "BRYNHILD_LOG_DIR_PRIVATE", new: "BRYNHILD_LOGGING__PRIVATE" },
    LegacyMapping { old: "BRYNHILD_RAW_LOG", new: "BRYNHILD_LOGGING__RAW_PAYLOADS" },
    LegacyMapping { old: "BRYNHILD_DISABLED_TOOLS", new: "BRYNHILD_TOOLS__DISABLED" },
    LegacyMapping { old: "BRYNHILD_DISABLE_BUILTIN_TOOLS", new: "BRYNHILD_TOOLS__DISABLED__BUILTIN" },
];

/// Scans the process environment for legacy vars and returns the mappings
/// that matched, so the caller can log a deprecation warning per hit.
pub fn check_legacy_env_vars() -> Vec<LegacyMapping> {
    LEGACY_ENV_VARS
        .iter()
        .copied()
        .filter(|mapping| std::env::var_os(mapping.old).is_some())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_legacy_var_when_set() {
        std::env::set_var("BRYNHILD_MODEL", "gpt-4");
        let hits = check_legacy_env_vars();
        std::env::remove_var("BRYNHILD_MODEL");
        assert!(hits.iter().any(|m| m.old == "BRYNHILD_MODEL"));
    }
}
