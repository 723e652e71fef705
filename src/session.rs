//! Per-session chat transcript over the sales data
//!
//! One session owns one transcript; nothing here is global. Submitting a
//! question appends exactly one user turn and one assistant turn, with the
//! assistant text coming from the bridge (or its sentinel on failure), so
//! the transcript always stays paired.

use crate::bridge::Bridge;
use crate::data::SalesRecord;
use tracing::debug;

/// Bounds for the recent-sales context window
const MIN_CONTEXT_ROWS: usize = 20;
const MAX_CONTEXT_ROWS: usize = 50;

/// Who produced a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

/// One entry of the transcript
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

/// Append-only chat transcript for one UI session
pub struct ChatSession {
    transcript: Vec<ChatTurn>,
    context_rows: usize,
}

impl ChatSession {
    /// Create a session whose prompts carry the last `context_rows` sales
    /// rows as context (clamped to a sane window).
    pub fn new(context_rows: usize) -> Self {
        Self {
            transcript: Vec::new(),
            context_rows: context_rows.clamp(MIN_CONTEXT_ROWS, MAX_CONTEXT_ROWS),
        }
    }

    /// Submit a question.
    ///
    /// Returns `None` without touching the transcript when the immediately
    /// preceding entry is a user turn with identical text (a double
    /// submission from a UI re-render). Otherwise appends the user turn,
    /// asks the bridge, appends the assistant turn and returns its text.
    pub async fn submit(
        &mut self,
        question: &str,
        bridge: &Bridge,
        sales: &[SalesRecord],
    ) -> Option<String> {
        if self
            .transcript
            .last()
            .is_some_and(|turn| turn.role == ChatRole::User && turn.text == question)
        {
            debug!("Duplicate submission ignored");
            return None;
        }

        self.transcript.push(ChatTurn {
            role: ChatRole::User,
            text: question.to_string(),
        });

        let prompt = self.build_prompt(question, sales);
        let answer = match bridge.ask(&prompt).await {
            Ok(text) => text,
            Err(e) => e.sentinel().to_string(),
        };

        self.transcript.push(ChatTurn {
            role: ChatRole::Assistant,
            text: answer.clone(),
        });

        Some(answer)
    }

    fn build_prompt(&self, question: &str, sales: &[SalesRecord]) -> String {
        let start = sales.len().saturating_sub(self.context_rows);
        let mut context = String::new();
        for record in &sales[start..] {
            context.push_str(&format!(
                "{} | {} | {}\n",
                record.customer, record.items, record.total_value
            ));
        }
        format!(
            "Dados: {}. Pergunta: {}. Responda curto e com emojis.",
            context.trim_end(),
            question
        )
    }

    /// Full transcript in append order.
    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    /// Turns grouped two-at-a-time in append order. The second element is
    /// `None` only for a pair whose assistant turn has not landed yet.
    pub fn pairs(&self) -> Vec<(&ChatTurn, Option<&ChatTurn>)> {
        self.transcript
            .chunks(2)
            .map(|pair| (&pair[0], pair.get(1)))
            .collect()
    }

    /// Pairs in display order: most recent first.
    pub fn display_pairs(&self) -> Vec<(&ChatTurn, Option<&ChatTurn>)> {
        let mut pairs = self.pairs();
        pairs.reverse();
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::testing::ScriptedProvider;
    use crate::provider::LlmProvider;
    use std::sync::Arc;

    fn sales() -> Vec<SalesRecord> {
        vec![
            SalesRecord {
                customer: "Ana".to_string(),
                items: "Pizza+Suco".to_string(),
                total_value: "50.0".to_string(),
            },
            SalesRecord {
                customer: "Ana".to_string(),
                items: "Pizza".to_string(),
                total_value: "30.0".to_string(),
            },
        ]
    }

    fn bridge_with(provider: &Arc<ScriptedProvider>) -> Bridge {
        Bridge::new(Arc::clone(provider) as Arc<dyn LlmProvider>)
    }

    #[tokio::test]
    async fn submission_appends_one_pair() {
        let provider = Arc::new(ScriptedProvider::replying("R$ 80,00 💰"));
        let bridge = bridge_with(&provider);
        let mut session = ChatSession::new(30);

        let answer = session.submit("Faturamento total?", &bridge, &sales()).await;
        assert_eq!(answer.as_deref(), Some("R$ 80,00 💰"));
        assert_eq!(session.transcript().len(), 2);
        assert_eq!(session.transcript()[0].role, ChatRole::User);
        assert_eq!(session.transcript()[1].role, ChatRole::Assistant);
    }

    #[tokio::test]
    async fn duplicate_question_without_answer_is_a_no_op() {
        let provider = Arc::new(ScriptedProvider::replying("ok"));
        let bridge = bridge_with(&provider);
        let mut session = ChatSession::new(30);

        // Simulate the first half of a double-fired submission: the user
        // turn landed but no assistant turn followed yet.
        session.transcript.push(ChatTurn {
            role: ChatRole::User,
            text: "Melhor cliente?".to_string(),
        });

        let answer = session.submit("Melhor cliente?", &bridge, &sales()).await;
        assert_eq!(answer, None);
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn repeating_an_answered_question_is_allowed() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok("resposta 1".to_string()),
            Ok("resposta 2".to_string()),
        ]));
        let bridge = bridge_with(&provider);
        let mut session = ChatSession::new(30);

        session.submit("Top produto?", &bridge, &sales()).await;
        session.submit("Top produto?", &bridge, &sales()).await;
        // the intervening assistant turn makes the second submission real
        assert_eq!(session.transcript().len(), 4);
    }

    #[tokio::test]
    async fn bridge_failure_still_pairs_the_transcript() {
        let bridge = Bridge::offline();
        let mut session = ChatSession::new(30);

        let answer = session.submit("Faturamento?", &bridge, &sales()).await;
        assert_eq!(answer.as_deref(), Some(crate::bridge::OFFLINE_SENTINEL));
        assert_eq!(session.transcript().len(), 2);
    }

    #[tokio::test]
    async fn display_order_is_most_recent_first() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok("r1".to_string()),
            Ok("r2".to_string()),
        ]));
        let bridge = bridge_with(&provider);
        let mut session = ChatSession::new(30);

        session.submit("p1", &bridge, &sales()).await;
        session.submit("p2", &bridge, &sales()).await;

        let pairs = session.display_pairs();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].0.text, "p2");
        assert_eq!(pairs[0].1.unwrap().text, "r2");
        assert_eq!(pairs[1].0.text, "p1");
    }

    #[tokio::test]
    async fn prompt_carries_only_the_recent_window() {
        let provider = Arc::new(ScriptedProvider::replying("ok"));
        let bridge = bridge_with(&provider);
        let mut session = ChatSession::new(20);

        let mut many: Vec<SalesRecord> = Vec::new();
        for i in 0..60 {
            many.push(SalesRecord {
                customer: format!("cliente-{i}"),
                items: "Pizza".to_string(),
                total_value: "10.0".to_string(),
            });
        }

        let prompt = session.build_prompt("Faturamento?", &many);
        assert!(!prompt.contains("cliente-0 "));
        assert!(prompt.contains("cliente-59"));
        // window clamps to at least 20 rows
        assert!(prompt.contains("cliente-40"));

        session.submit("Faturamento?", &bridge, &many).await;
        assert_eq!(provider.call_count(), 1);
    }
}
