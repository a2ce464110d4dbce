//! Deterministic provider that replays a programmed sequence of replies.
//!
//! Used by tests and offline runs. Every request is recorded so callers can
//! assert how many attempts were made and what each prompt contained.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::trait_def::CompletionProvider;
use super::types::{CompletionRequest, ProviderError};

/// One programmed reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedReply {
    /// Return this raw text.
    Text(String),
    /// Fail the call with this message.
    Error(String),
    /// Never resolve; the caller must cancel.
    Pending,
}

#[derive(Debug, Default)]
struct Script {
    replies: VecDeque<ScriptedReply>,
    requests: Vec<CompletionRequest>,
}

/// A [`CompletionProvider`] that pops replies from a queue.
#[derive(Debug)]
pub struct ScriptedProvider {
    name: String,
    script: Mutex<Script>,
}

impl ScriptedProvider {
    pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self::named("scripted", replies)
    }

    pub fn named(name: &str, replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self {
            name: name.to_string(),
            script: Mutex::new(Script {
                replies: replies.into_iter().collect(),
                requests: Vec::new(),
            }),
        }
    }

    /// Shorthand for a script of plain text replies.
    pub fn from_texts<S: Into<String>>(texts: impl IntoIterator<Item = S>) -> Self {
        Self::new(texts.into_iter().map(|t| ScriptedReply::Text(t.into())))
    }

    /// Every request received so far, in call order.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.script.lock().await.requests.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.script.lock().await.requests.len()
    }

    /// Replies not yet consumed.
    pub async fn remaining(&self) -> usize {
        self.script.lock().await.replies.len()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate_config(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let reply = {
            let mut script = self.script.lock().await;
            script.requests.push(request.clone());
            script.replies.pop_front()
        };

        match reply {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Error(message)) => Err(ProviderError::Other(message)),
            Some(ScriptedReply::Pending) => std::future::pending().await,
            None => Err(ProviderError::Other("no more scripted replies".to_string())),
        }
    }
}
