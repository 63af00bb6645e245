//! Deterministic offline gateway.

use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

use super::{CompletionError, CompletionGateway, CompletionResult};
use crate::meeting::ActionItem;

/// Summarizes from the first two sentences of the transcript and always
/// returns the same two placeholder action items.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubGateway;

fn sentence_break() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.?!]\s").expect("sentence regex is valid"))
}

impl StubGateway {
    pub fn summarize(transcript: &str) -> CompletionResult {
        let lead = sentence_break()
            .split(transcript)
            .take(2)
            .collect::<Vec<_>>()
            .join(". ");
        let lead = if lead.is_empty() {
            "Discussion held.".to_string()
        } else {
            lead
        };

        CompletionResult {
            summary: format!("Summary: {}. Key decisions captured.", lead),
            action_items: vec![ActionItem::new("Share notes"), ActionItem::new("Assign owners")],
        }
    }
}

#[async_trait]
impl CompletionGateway for StubGateway {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn complete(
        &self,
        _title: &str,
        transcript: &str,
    ) -> Result<CompletionResult, CompletionError> {
        Ok(Self::summarize(transcript))
    }
}
