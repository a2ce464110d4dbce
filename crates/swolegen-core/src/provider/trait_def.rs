//! The `CompletionProvider` trait -- the seam between the pipeline and a
//! model backend.
//!
//! The trait is object-safe so providers can be stored as
//! `Arc<dyn CompletionProvider>` in the [`super::ProviderRegistry`] and
//! the pipeline.

use async_trait::async_trait;

use super::types::{CompletionRequest, ProviderError};

/// A backend that turns a [`CompletionRequest`] into raw text.
///
/// Implementations must tolerate repeated calls with different prompts on
/// the same instance. Cancellation is handled by the caller dropping the
/// returned future.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Registry name (e.g. "openai").
    fn name(&self) -> &str;

    /// Check that the provider can make calls, without making one.
    fn validate_config(&self) -> Result<(), ProviderError>;

    /// Run one completion and return the raw model output.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;
}

// Compile-time assertion: CompletionProvider must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn CompletionProvider) {}
};
