//! Portal analysis orchestration
//!
//! The engine runs the three partner-facing analyses over the loaded
//! datasets: support triage, sales aggregation (with combo suggestions) and
//! the per-customer "sniper" push generator. Each analysis is independent
//! and survives an offline or failing bridge: AI-generated fields carry the
//! bridge sentinel instead of aborting the run.

use crate::aggregate::{favorite_item, SalesSummary};
use crate::bridge::Bridge;
use crate::data::{DataError, SalesRecord, TicketRecord};
use crate::triage::{parse_triage, TriageReply};
use crate::PortalConfig;
use thiserror::Error;
use tracing::{info, warn};

/// Errors from running an analysis
#[derive(Error, Debug)]
pub enum PortalError {
    #[error(transparent)]
    Data(#[from] DataError),
}

/// One triaged support ticket
#[derive(Debug, Clone)]
pub struct TicketTriage {
    pub ticket_id: String,
    pub customer_message: String,
    /// Parsed triage, or the bridge sentinel wrapped as a fallback
    pub reply: TriageReply,
}

/// Output of the support module
#[derive(Debug, Clone)]
pub struct SupportReport {
    /// Full queue size, not just the triaged slice
    pub pending: usize,
    pub triages: Vec<TicketTriage>,
}

/// Output of the sales module
#[derive(Debug, Clone)]
pub struct SalesReport {
    pub summary: SalesSummary,
    /// Promotional combo suggestions for the top item, when one exists and
    /// the bridge answered
    pub combo_ideas: Option<String>,
}

/// One targeted push offer from the CRM module
#[derive(Debug, Clone)]
pub struct PushOffer {
    pub customer: String,
    pub favorite: String,
    pub message: String,
}

/// Orchestrates the three portal analyses
pub struct PortalEngine {
    config: PortalConfig,
    bridge: Bridge,
}

impl PortalEngine {
    pub fn new(config: PortalConfig, bridge: Bridge) -> Self {
        Self { config, bridge }
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    /// Triage the head of the support queue.
    pub async fn support_report(&self, tickets: &[TicketRecord]) -> SupportReport {
        let mut triages = Vec::new();

        for ticket in tickets.iter().take(self.config.triage_limit) {
            let prompt = triage_prompt(&ticket.customer_message);
            let reply = match self.bridge.ask(&prompt).await {
                Ok(text) => parse_triage(&text),
                Err(e) => TriageReply::Fallback {
                    raw: e.sentinel().to_string(),
                },
            };
            triages.push(TicketTriage {
                ticket_id: ticket.id.clone(),
                customer_message: ticket.customer_message.clone(),
                reply,
            });
        }

        info!(pending = tickets.len(), triaged = triages.len(), "Support report ready");

        SupportReport {
            pending: tickets.len(),
            triages,
        }
    }

    /// Aggregate the sales dataset and, when possible, generate combo
    /// suggestions for the most frequent item.
    pub async fn sales_report(&self, sales: &[SalesRecord]) -> Result<SalesReport, PortalError> {
        let summary = SalesSummary::compute(sales, self.config.item_separator)?;

        let combo_ideas = match &summary.top_item {
            Some(top) if self.bridge.is_online() => {
                match self.bridge.ask(&combo_prompt(top)).await {
                    Ok(text) => Some(text),
                    Err(e) => {
                        warn!(error = %e, "Combo generation failed");
                        None
                    }
                }
            }
            _ => None,
        };

        info!(
            orders = summary.record_count,
            revenue = summary.total_value,
            top_item = summary.top_item_label(),
            "Sales report ready"
        );

        Ok(SalesReport {
            summary,
            combo_ideas,
        })
    }

    /// Generate one push offer per distinct customer, in first-seen order.
    /// Customers whose rows carry no item tokens are skipped.
    pub async fn crm_report(&self, sales: &[SalesRecord]) -> Vec<PushOffer> {
        let mut offers = Vec::new();

        for customer in distinct_customers(sales) {
            let Some(favorite) = favorite_item(sales, customer, self.config.item_separator)
            else {
                continue;
            };

            let message = match self.bridge.ask(&push_prompt(customer, &favorite)).await {
                Ok(text) => text,
                Err(e) => e.sentinel().to_string(),
            };

            offers.push(PushOffer {
                customer: customer.to_string(),
                favorite,
                message,
            });
        }

        info!(offers = offers.len(), "CRM report ready");
        offers
    }
}

fn distinct_customers(sales: &[SalesRecord]) -> Vec<&str> {
    let mut seen = Vec::new();
    for record in sales {
        if !seen.contains(&record.customer.as_str()) {
            seen.push(record.customer.as_str());
        }
    }
    seen
}

fn triage_prompt(message: &str) -> String {
    format!(
        "Analise este ticket de suporte: '{message}'. \
         1. Classifique: URGENTE, MEDIA ou BAIXA. \
         2. Dê uma ação prática curta para evitar o CHURN (perda do cliente). \
         3. Escreva uma resposta curta e empática para o cliente. \
         Responda estritamente no formato: CLASSIFICACAO | ACAO ANTI-CHURN | RESPOSTA AO CLIENTE"
    )
}

fn combo_prompt(top_item: &str) -> String {
    format!(
        "Crie 5 sugestões de COMBOS promocionais diferentes e criativos \
         envolvendo {top_item}. Formato lista markdown simples."
    )
}

fn push_prompt(customer: &str, favorite: &str) -> String {
    format!(
        "Aja como o app de delivery. O cliente {customer} ama {favorite}. \
         Escreva UMA ÚNICA notificação push para enviar agora. \
         Regras: sem listas, sem introdução, curto, urgente e com emoji. \
         Texto final apenas."
    )
}
