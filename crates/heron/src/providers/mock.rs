use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::Mutex;

use crate::models::message::Message;
use crate::models::tool::Tool;
use crate::providers::base::{Provider, Usage};

/// A provider that replays pre-configured responses.
///
/// Used by tests throughout the workspace and handy for driving the loop
/// offline. Not test-gated on purpose: downstream crates need it in their
/// own test suites.
pub struct MockProvider {
    responses: Arc<Mutex<Vec<Message>>>,
    repeat_last: bool,
}

impl MockProvider {
    /// Replay `responses` in order, then answer with empty text.
    pub fn new(responses: Vec<Message>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            repeat_last: false,
        }
    }

    /// Return the same response on every call, forever. Useful for
    /// exercising the iteration ceiling against a backend that never stops
    /// asking for tools.
    pub fn repeating(response: Message) -> Self {
        Self {
            responses: Arc::new(Mutex::new(vec![response])),
            repeat_last: true,
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(
        &self,
        _system: &str,
        _messages: &[Message],
        _tools: &[Tool],
    ) -> Result<(Message, Usage)> {
        let mut responses = self.responses.lock().unwrap();
        if self.repeat_last {
            let response = responses
                .last()
                .cloned()
                .unwrap_or_else(|| Message::assistant().with_text(""));
            return Ok((response, Usage::default()));
        }
        if responses.is_empty() {
            // Out of script: return an empty response
            Ok((Message::assistant().with_text(""), Usage::default()))
        } else {
            Ok((responses.remove(0), Usage::default()))
        }
    }
}
