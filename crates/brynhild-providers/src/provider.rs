//! The provider trait every backend implements, and the two registries
//! dispatch goes through: a `type` discriminator -> constructor table
//! (`ProviderTypeRegistry`, built once) and a resolved-instance-name ->
//! provider table (`ProviderRegistry`, populated from config at startup).

use std::collections::HashMap;
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::anthropic::AnthropicProvider;
use crate::error::{ProviderError, Result};
use crate::ollama::OllamaProvider;
use crate::openai_compat::OpenAiCompatibleProvider;
use crate::types::{ChatRequest, StreamEvent};

pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

/// A dispatchable LLM backend.
#[async_trait]
pub trait Provider: Send + Sync {
    /// The `type` discriminator this provider answers to (`"anthropic"`,
    /// `"openai"`, `"ollama"`, `"openrouter"`, ...).
    fn provider_type(&self) -> &'static str;

    /// Whether this provider's wire format supports tool calling at all.
    fn supports_tools(&self) -> bool {
        true
    }

    /// Whether this provider's wire format has any mechanism for conveying
    /// a reasoning/thinking effort level.
    fn supports_reasoning(&self) -> bool {
        true
    }

    /// Opens a streaming completion, returning a normalized `StreamEvent`
    /// stream.
    async fn stream(&self, request: ChatRequest) -> Result<EventStream>;
}

/// The handful of fields every provider constructor needs, resolved from
/// `providers.<instance-name>` in config.
#[derive(Debug, Clone, Default)]
pub struct ProviderInstanceConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

type Constructor = fn(&ProviderInstanceConfig) -> Result<Box<dyn Provider>>;

/// Maps a config-level `type` discriminator to the constructor that builds
/// it. Unknown types fail listing the types actually registered; a stub
/// type (a backend named in config but not yet wired up) registers a
/// constructor that returns [`ProviderError::NotImplemented`].
pub struct ProviderTypeRegistry {
    ctors: HashMap<&'static str, Constructor>,
}

impl ProviderTypeRegistry {
    pub fn new() -> Self {
        Self { ctors: HashMap::new() }
    }

    /// Registers `ctor` under `tag`. Call this to extend the registry with
    /// a backend beyond the built-in set, or to override one.
    pub fn register_provider_type(&mut self, tag: &'static str, ctor: Constructor) {
        self.ctors.insert(tag, ctor);
    }

    /// Builds a provider for `tag`. Fails with the sorted list of
    /// registered types when `tag` is unknown.
    pub fn build(&self, tag: &str, config: &ProviderInstanceConfig) -> Result<Box<dyn Provider>> {
        let ctor = self.ctors.get(tag).ok_or_else(|| {
            let mut available: Vec<String> = self.ctors.keys().map(|s| s.to_string()).collect();
            available.sort();
            ProviderError::UnknownProviderType { requested: tag.to_string(), available }
        })?;
        ctor(config)
    }

    pub fn provider_types(&self) -> Vec<&'static str> {
        let mut types: Vec<_> = self.ctors.keys().copied().collect();
        types.sort();
        types
    }

    /// The registry pre-loaded with every backend this crate ships:
    /// `anthropic`, `openai`, `ollama`, `openrouter` (OpenAI-compatible,
    /// default base URL pointed at OpenRouter), plus `vllm`/`lmstudio` as
    /// not-implemented stubs that still appear in `provider_types()`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry.register_provider_type("anthropic", |cfg| {
            let api_key = cfg
                .api_key
                .clone()
                .ok_or_else(|| ProviderError::MissingApiKey { provider: "anthropic".into() })?;
            Ok(match &cfg.base_url {
                Some(base_url) => Box::new(AnthropicProvider::with_base_url(api_key, base_url.clone())),
                None => Box::new(AnthropicProvider::new(api_key)),
            })
        });

        registry.register_provider_type("openai", |cfg| {
            let api_key = cfg
                .api_key
                .clone()
                .ok_or_else(|| ProviderError::MissingApiKey { provider: "openai".into() })?;
            Ok(match &cfg.base_url {
                Some(base_url) => Box::new(OpenAiCompatibleProvider::with_base_url(api_key, base_url.clone())),
                None => Box::new(OpenAiCompatibleProvider::new(api_key)),
            })
        });

        registry.register_provider_type("openrouter", |cfg| {
            let api_key = cfg
                .api_key
                .clone()
                .ok_or_else(|| ProviderError::MissingApiKey { provider: "openrouter".into() })?;
            let base_url = cfg
                .base_url
                .clone()
                .unwrap_or_else(|| "https://openrouter.ai/api/v1".to_string());
            Ok(Box::new(OpenAiCompatibleProvider::with_base_url(api_key, base_url)))
        });

        registry.register_provider_type("ollama", |cfg| {
            Ok(match &cfg.base_url {
                Some(base_url) => Box::new(OllamaProvider::with_base_url(base_url.clone())),
                None => Box::new(OllamaProvider::new()),
            })
        });

        registry.register_provider_type("vllm", |_cfg| {
            Err(ProviderError::NotImplemented { provider_type: "vllm".into() })
        });
        registry.register_provider_type("lmstudio", |_cfg| {
            Err(ProviderError::NotImplemented { provider_type: "lmstudio".into() })
        });

        registry
    }
}

impl Default for ProviderTypeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Dispatch table from a resolved provider *instance name* (e.g. the
/// `"work-openai"` a user picked for one of their `providers.instances`
/// entries) to the provider [`ProviderTypeRegistry::build`] constructed for
/// it.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Box<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, provider: Box<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    pub fn get(&self, name: &str) -> Result<&dyn Provider> {
        self.providers
            .get(name)
            .map(|p| p.as_ref())
            .ok_or_else(|| ProviderError::UnknownProvider(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(|s| s.as_str()).collect()
    }
}
