//! Dialogue oracle: narrative generation for negotiation turns.
//!
//! The oracle receives a role prompt and the conversation so far and returns
//! free text. There is no contract on content: the text is transcript and
//! logging flavor only, never parsed back into state. Failures are expected
//! and tolerated per turn by the session scheduler.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Oracle failure for a single turn.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("dialogue oracle unavailable: {0}")]
    Unavailable(String),
}

/// One entry in a session transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    pub speaker: String,
    pub text: String,
}

/// Generates one turn of dialogue given a role prompt and history.
#[async_trait]
pub trait DialogueOracle: Send + Sync {
    async fn generate(
        &self,
        role_prompt: &str,
        conversation: &[Utterance],
    ) -> Result<String, OracleError>;
}

/// Oracle backed by an OpenAI-compatible chat completions endpoint.
pub struct ChatOracle {
    client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl ChatOracle {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            temperature: 0.7,
            max_tokens: 256,
        }
    }

    fn format_history(conversation: &[Utterance]) -> String {
        if conversation.is_empty() {
            return "Begin the coordination session.".to_string();
        }
        conversation
            .iter()
            .map(|u| format!("[{}] {}", u.speaker, u.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl DialogueOracle for ChatOracle {
    async fn generate(
        &self,
        role_prompt: &str,
        conversation: &[Utterance],
    ) -> Result<String, OracleError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: role_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Self::format_history(conversation),
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let url = format!("{}/v1/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| OracleError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(OracleError::Unavailable(format!(
                "status {}",
                response.status()
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Unavailable(e.to_string()))?;

        chat.choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| OracleError::Unavailable("empty choices".to_string()))
    }
}

/// Oracle that says nothing, for offline/narration-free campaigns.
///
/// State transitions never depend on oracle output, so a silent oracle
/// produces exactly the same campaign as a talkative one.
pub struct SilentOracle;

#[async_trait]
impl DialogueOracle for SilentOracle {
    async fn generate(
        &self,
        _role_prompt: &str,
        _conversation: &[Utterance],
    ) -> Result<String, OracleError> {
        Ok(String::new())
    }
}

/// Oracle that cycles through canned lines; handy for demos and tests.
pub struct ScriptedOracle {
    lines: Vec<String>,
    next: Mutex<usize>,
}

impl ScriptedOracle {
    pub fn new(lines: Vec<String>) -> Self {
        Self {
            lines,
            next: Mutex::new(0),
        }
    }
}

#[async_trait]
impl DialogueOracle for ScriptedOracle {
    async fn generate(
        &self,
        _role_prompt: &str,
        _conversation: &[Utterance],
    ) -> Result<String, OracleError> {
        if self.lines.is_empty() {
            return Ok(String::new());
        }
        let mut next = self.next.lock().expect("oracle cursor poisoned");
        let line = self.lines[*next % self.lines.len()].clone();
        *next += 1;
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_formatting() {
        let conversation = vec![
            Utterance {
                speaker: "B".to_string(),
                text: "BOTTLENECK STATUS: 100/min".to_string(),
            },
            Utterance {
                speaker: "C1".to_string(),
                text: "Proposing -2".to_string(),
            },
        ];
        let formatted = ChatOracle::format_history(&conversation);
        assert!(formatted.contains("[B] BOTTLENECK STATUS"));
        assert!(formatted.contains("[C1] Proposing -2"));

        let empty = ChatOracle::format_history(&[]);
        assert!(empty.contains("Begin"));
    }

    #[tokio::test]
    async fn test_scripted_oracle_cycles() {
        let oracle = ScriptedOracle::new(vec!["one".to_string(), "two".to_string()]);
        assert_eq!(oracle.generate("p", &[]).await.unwrap(), "one");
        assert_eq!(oracle.generate("p", &[]).await.unwrap(), "two");
        assert_eq!(oracle.generate("p", &[]).await.unwrap(), "one");
    }

    #[tokio::test]
    async fn test_silent_oracle_is_empty() {
        assert_eq!(SilentOracle.generate("p", &[]).await.unwrap(), "");
    }

    #[test]
    fn test_chat_oracle_trims_trailing_slash() {
        let oracle = ChatOracle::new("http://localhost:11434/", "qwen2.5:1.5b");
        assert_eq!(oracle.base_url, "http://localhost:11434");
    }
}
