//! Turns a voice-note transcript into concise care notes via chat completion

use anyhow::Result;
use log::{debug, info};
use openai::chat::{ChatCompletion, ChatCompletionMessage, ChatCompletionMessageRole};
use std::time::Duration;
use tokio::time::timeout;

pub const EMPTY_TRANSCRIPT_SUMMARY: &str = "No text to summarize.";

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that summarizes spoken text into concise, well-formatted notes.";

fn message(role: ChatCompletionMessageRole, content: String) -> ChatCompletionMessage {
    ChatCompletionMessage {
        role,
        content: Some(content),
        name: None,
        function_call: None,
        tool_call_id: None,
        tool_calls: None,
    }
}

#[derive(Clone)]
pub struct NoteSummarizer {
    model: String,
}

impl NoteSummarizer {
    pub fn new(model: impl Into<String>) -> Self {
        NoteSummarizer {
            model: model.into(),
        }
    }

    pub async fn summarize(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(EMPTY_TRANSCRIPT_SUMMARY.to_string());
        }

        let prompt = format!(
            "Please summarize and refine the following spoken text into concise notes:\n\n{text}"
        );
        let messages = vec![
            message(ChatCompletionMessageRole::System, SYSTEM_PROMPT.to_string()),
            message(ChatCompletionMessageRole::User, prompt),
        ];
        debug!("Requesting summary from {} for {} chars", self.model, text.len());

        let completion = timeout(
            Duration::from_secs(45),
            ChatCompletion::builder(&self.model, messages).create(),
        )
        .await
        .map_err(|_| anyhow::anyhow!("OpenAI request timed out after 45 seconds"))??;

        let summary = completion
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default()
            .trim()
            .to_string();

        info!("Generated summary for text: {}...", text.chars().take(50).collect::<String>());
        Ok(summary)
    }
}
