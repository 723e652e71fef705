//! One-shot bridge to the text-generation service
//!
//! The portal treats the external model as unreliable but not worth retry
//! engineering: every ask is a single attempt, and every failure mode maps
//! to a typed error the caller can branch on. The legacy UI strings
//! ("Offline.", "Erro na IA.") survive only as [`BridgeError::sentinel`]
//! for rendering.

use crate::provider::{GenRequest, LlmProvider, ProviderError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Fixed reply shown when no credential is configured
pub const OFFLINE_SENTINEL: &str = "Offline.";

/// Fixed reply shown when the external call fails
pub const ERROR_SENTINEL: &str = "Erro na IA.";

/// Errors from asking the bridge
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("No generation provider configured")]
    Offline,

    #[error("Generation call failed: {0}")]
    Call(#[from] ProviderError),
}

impl BridgeError {
    /// The fixed user-facing string for this failure mode.
    pub fn sentinel(&self) -> &'static str {
        match self {
            BridgeError::Offline => OFFLINE_SENTINEL,
            BridgeError::Call(_) => ERROR_SENTINEL,
        }
    }
}

/// Shared, read-only handle to the generation service
///
/// Cloning is cheap; the provider is stateless per call and may be shared
/// across sessions.
#[derive(Clone)]
pub struct Bridge {
    provider: Option<Arc<dyn LlmProvider>>,
    temperature: Option<f32>,
}

impl Bridge {
    /// Create a bridge around a provider handle.
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider: Some(provider),
            temperature: None,
        }
    }

    /// Create a bridge with no provider; every ask returns
    /// [`BridgeError::Offline`] without touching the network.
    pub fn offline() -> Self {
        Self {
            provider: None,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Whether a provider is configured.
    pub fn is_online(&self) -> bool {
        self.provider.is_some()
    }

    /// Send one prompt and return the generated text.
    ///
    /// Exactly one attempt: no retry, no backoff.
    pub async fn ask(&self, prompt: &str) -> Result<String, BridgeError> {
        let provider = self.provider.as_ref().ok_or(BridgeError::Offline)?;

        let mut request = GenRequest::new(prompt);
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }

        debug!(provider = provider.name(), prompt_len = prompt.len(), "Asking bridge");

        match provider.generate(&request).await {
            Ok(response) => Ok(response.text),
            Err(e) => {
                warn!(provider = provider.name(), error = %e, "Generation call failed");
                Err(BridgeError::Call(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::testing::ScriptedProvider;

    #[tokio::test]
    async fn offline_bridge_never_calls_the_provider() {
        let bridge = Bridge::offline();
        let err = bridge.ask("Faturamento total?").await.unwrap_err();
        assert!(matches!(err, BridgeError::Offline));
        assert_eq!(err.sentinel(), OFFLINE_SENTINEL);
    }

    #[tokio::test]
    async fn online_bridge_returns_text() {
        let provider = Arc::new(ScriptedProvider::replying("R$ 80,00"));
        let bridge = Bridge::new(Arc::clone(&provider) as Arc<dyn LlmProvider>);
        let answer = bridge.ask("Faturamento total?").await.unwrap();
        assert_eq!(answer, "R$ 80,00");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn call_failure_maps_to_error_sentinel() {
        let provider = Arc::new(ScriptedProvider::failing("quota exceeded"));
        let bridge = Bridge::new(Arc::clone(&provider) as Arc<dyn LlmProvider>);
        let err = bridge.ask("Faturamento total?").await.unwrap_err();
        assert!(matches!(err, BridgeError::Call(_)));
        assert_eq!(err.sentinel(), ERROR_SENTINEL);
        // one attempt, no retry
        assert_eq!(provider.call_count(), 1);
    }
}
