//! Completion provider interface.
//!
//! This module defines the [`CompletionProvider`] trait that every model
//! backend implements, the [`CompletionRequest`] it consumes, and the
//! [`ProviderRegistry`] used to pick a backend by name at runtime.
//!
//! # Architecture
//!
//! ```text
//! Pipeline
//!     |
//!     v
//! ProviderRegistry --get("openai")--> Arc<dyn CompletionProvider>
//!     |                                        |
//!     |   validate_config() -------------------+
//!     |   complete(request) --> raw text | ProviderError
//! ```

pub mod openai;
pub mod registry;
pub mod scripted;
pub mod trait_def;
pub mod types;

// Re-export the primary public API at the module level.
pub use openai::{OpenAiConfig, OpenAiProvider};
pub use registry::ProviderRegistry;
pub use scripted::{ScriptedProvider, ScriptedReply};
pub use trait_def::CompletionProvider;
pub use types::{CompletionRequest, ProviderError};
