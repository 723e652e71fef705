//! Parsing of triage replies from the model
//!
//! The model is *asked* to answer in the form
//! `CLASSIFICACAO | ACAO ANTI-CHURN | RESPOSTA AO CLIENTE`, but that format
//! is advisory. The parser here never fails: anything that does not carry
//! two `|` separators degrades to a fallback where the whole reply becomes
//! the recommended action.

use std::fmt;

/// Generic label used when the model ignored the requested format
pub const FALLBACK_LABEL: &str = "ANÁLISE";

/// Placeholder customer reply used in the fallback case
pub const FALLBACK_CUSTOMER_REPLY: &str = "---";

/// Severity vocabulary for a triaged ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Urgente,
    Media,
    Baixa,
}

impl Severity {
    /// Case-insensitive substring match against the fixed vocabulary.
    /// Priority URGENTE > MEDIA; anything else is Baixa.
    pub fn from_label(label: &str) -> Self {
        let upper = label.to_uppercase();
        if upper.contains("URGENTE") {
            Severity::Urgente
        } else if upper.contains("MEDIA") {
            Severity::Media
        } else {
            Severity::Baixa
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Severity::Urgente => "URGENTE",
            Severity::Media => "MEDIA",
            Severity::Baixa => "BAIXA",
        };
        write!(f, "{tag}")
    }
}

/// A fully parsed triage
#[derive(Debug, Clone, PartialEq)]
pub struct Triage {
    /// Severity derived from the classification label
    pub severity: Severity,
    /// Classification label as written by the model
    pub label: String,
    /// Short anti-churn action for the operator
    pub action: String,
    /// Suggested empathetic reply to the customer
    pub customer_reply: String,
}

/// Result of parsing a triage reply
#[derive(Debug, Clone, PartialEq)]
pub enum TriageReply {
    /// The reply followed the three-field convention
    Parsed(Triage),
    /// The reply did not; the raw text is still usable as the action
    Fallback { raw: String },
}

impl TriageReply {
    /// Classification label, parsed or generic.
    pub fn label(&self) -> &str {
        match self {
            TriageReply::Parsed(triage) => &triage.label,
            TriageReply::Fallback { .. } => FALLBACK_LABEL,
        }
    }

    /// Severity, `Baixa` in the fallback case.
    pub fn severity(&self) -> Severity {
        match self {
            TriageReply::Parsed(triage) => triage.severity,
            TriageReply::Fallback { .. } => Severity::from_label(FALLBACK_LABEL),
        }
    }

    /// Recommended action: the parsed field, or the whole raw reply.
    pub fn action(&self) -> &str {
        match self {
            TriageReply::Parsed(triage) => &triage.action,
            TriageReply::Fallback { raw } => raw,
        }
    }

    /// Customer-facing reply, placeholder in the fallback case.
    pub fn customer_reply(&self) -> &str {
        match self {
            TriageReply::Parsed(triage) => &triage.customer_reply,
            TriageReply::Fallback { .. } => FALLBACK_CUSTOMER_REPLY,
        }
    }
}

/// Parse a raw model reply into a [`TriageReply`]. Pure, never fails.
pub fn parse_triage(raw: &str) -> TriageReply {
    let parts: Vec<&str> = raw.split('|').collect();
    if parts.len() >= 3 {
        let label = parts[0].trim().to_string();
        TriageReply::Parsed(Triage {
            severity: Severity::from_label(&label),
            label,
            action: parts[1].trim().to_string(),
            customer_reply: parts[2].trim().to_string(),
        })
    } else {
        TriageReply::Fallback {
            raw: raw.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_three_field_convention() {
        let reply = parse_triage("URGENTE | Ligar imediatamente | Desculpe o transtorno");
        match &reply {
            TriageReply::Parsed(triage) => {
                assert_eq!(triage.severity, Severity::Urgente);
                assert_eq!(triage.label, "URGENTE");
                assert_eq!(triage.action, "Ligar imediatamente");
                assert_eq!(triage.customer_reply, "Desculpe o transtorno");
            }
            TriageReply::Fallback { .. } => panic!("expected parsed triage"),
        }
        assert_eq!(reply.action(), "Ligar imediatamente");
    }

    #[test]
    fn reply_without_pipes_degrades_instead_of_failing() {
        let raw = "O cliente parece irritado, priorize o reembolso.";
        let reply = parse_triage(raw);
        assert_eq!(reply.action(), raw);
        assert_eq!(reply.label(), FALLBACK_LABEL);
        assert_eq!(reply.customer_reply(), FALLBACK_CUSTOMER_REPLY);
        assert_eq!(reply.severity(), Severity::Baixa);
    }

    #[test]
    fn one_pipe_is_still_a_fallback() {
        let reply = parse_triage("MEDIA | Responder em 24h");
        assert!(matches!(reply, TriageReply::Fallback { .. }));
    }

    #[test]
    fn extra_segments_keep_positional_assignment() {
        let reply = parse_triage("BAIXA | Nenhuma ação | Obrigado! | extra");
        assert_eq!(reply.label(), "BAIXA");
        assert_eq!(reply.customer_reply(), "Obrigado!");
    }

    #[test]
    fn severity_matches_substrings_case_insensitively() {
        assert_eq!(Severity::from_label("caso urgente!"), Severity::Urgente);
        assert_eq!(Severity::from_label("Prioridade Media"), Severity::Media);
        assert_eq!(Severity::from_label("tranquilo"), Severity::Baixa);
        // both present: URGENTE wins
        assert_eq!(Severity::from_label("media/urgente"), Severity::Urgente);
    }
}
