//! Genius Engine - Partner portal analytics over a hosted LLM
//!
//! This crate provides:
//! - CSV loaders for the support-ticket and sales datasets
//! - Pure aggregation (order counts, revenue, most-frequent item)
//! - A one-shot bridge to a Gemini-style text generation service
//! - Ticket triage parsing with a fixed severity vocabulary
//! - A per-session chat transcript grounded in recent sales rows

pub mod aggregate;
pub mod bridge;
pub mod data;
pub mod portal;
pub mod provider;
pub mod session;
pub mod triage;

pub use bridge::{Bridge, BridgeError};
pub use portal::PortalEngine;
pub use provider::{GenRequest, GenResponse, LlmProvider};

/// Configuration for the portal engine
#[derive(Debug, Clone, serde::Deserialize)]
pub struct PortalConfig {
    /// Path to the support-ticket CSV
    #[serde(default = "default_tickets_path")]
    pub tickets_path: String,

    /// Path to the sales CSV
    #[serde(default = "default_sales_path")]
    pub sales_path: String,

    /// How many tickets get triaged per run
    #[serde(default = "default_triage_limit")]
    pub triage_limit: usize,

    /// How many recent sales rows feed the chat context
    #[serde(default = "default_chat_context_rows")]
    pub chat_context_rows: usize,

    /// Separator joining item names inside the `itens` column
    #[serde(default = "default_item_separator")]
    pub item_separator: char,

    /// Text-generation provider configuration
    #[serde(default)]
    pub provider: GeminiConfig,
}

fn default_tickets_path() -> String { "data/suporte.csv".to_string() }
fn default_sales_path() -> String { "data/vendas.csv".to_string() }
fn default_triage_limit() -> usize { 5 }
fn default_chat_context_rows() -> usize { 30 }
fn default_item_separator() -> char { '+' }

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            tickets_path: default_tickets_path(),
            sales_path: default_sales_path(),
            triage_limit: default_triage_limit(),
            chat_context_rows: default_chat_context_rows(),
            item_separator: default_item_separator(),
            provider: GeminiConfig::default(),
        }
    }
}

/// Configuration for the Gemini provider
#[derive(Debug, Clone, serde::Deserialize)]
pub struct GeminiConfig {
    /// Base URL of the generative language API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model name; "auto" resolves the first available flash model
    #[serde(default = "default_model")]
    pub model: String,

    /// API key; empty means offline mode (no call is ever attempted)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_model() -> String { "gemini-1.5-flash".to_string() }
fn default_timeout_secs() -> u64 { 30 }

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_from_empty_toml() {
        let config: PortalConfig = toml::from_str("").unwrap();
        assert_eq!(config.triage_limit, 5);
        assert_eq!(config.chat_context_rows, 30);
        assert_eq!(config.item_separator, '+');
        assert!(config.provider.api_key.is_none());
    }

    #[test]
    fn config_overrides() {
        let config: PortalConfig = toml::from_str(
            r#"
            sales_path = "vendas_2026.csv"
            triage_limit = 3

            [provider]
            model = "gemini-1.5-pro"
            timeout_secs = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.sales_path, "vendas_2026.csv");
        assert_eq!(config.triage_limit, 3);
        assert_eq!(config.provider.model, "gemini-1.5-pro");
        assert_eq!(config.provider.timeout_secs, 10);
    }
}
