//! Completion backends the pipeline can be pointed at.
//!
//! Each run talks to exactly one provider. The caller registers every backend
//! it can construct, then [`ProviderRegistry::select`] resolves the
//! configured name (`--provider`, default `openai`) to the one the pipeline
//! is built with.

use std::collections::HashMap;
use std::sync::Arc;

use super::trait_def::CompletionProvider;
use super::types::ProviderError;

/// Backends available for a run, keyed by [`CompletionProvider::name`].
///
/// # Example
///
/// ```ignore
/// let mut registry = ProviderRegistry::new();
/// registry.register(OpenAiProvider::new(config)?);
/// let provider = registry.select("openai")?;
/// let pipeline = Pipeline::builder().provider(provider).build()?;
/// ```
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn CompletionProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under the name returned by
    /// [`CompletionProvider::name`], replacing and returning any previous
    /// provider with that name.
    pub fn register(
        &mut self,
        provider: impl CompletionProvider + 'static,
    ) -> Option<Arc<dyn CompletionProvider>> {
        let name = provider.name().to_string();
        self.providers.insert(name, Arc::new(provider))
    }

    /// Look up a provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn CompletionProvider>> {
        self.providers.get(name).cloned()
    }

    /// Resolve the provider a run should use. An unknown name is a
    /// configuration error naming the providers that are available.
    pub fn select(&self, name: &str) -> Result<Arc<dyn CompletionProvider>, ProviderError> {
        self.get(name).ok_or_else(|| {
            ProviderError::Config(format!(
                "unknown provider {name:?} (available: {})",
                self.list().join(", ")
            ))
        })
    }

    /// Names of all registered providers, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.list())
            .finish()
    }
}
