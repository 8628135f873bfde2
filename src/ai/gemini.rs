//! Client for the Gemini generateContent REST API.
//!
//! Every failure mode (missing key, transport error, API error, empty
//! candidates) degrades to static fallback text; callers never see an
//! error for a generation request.

use serde::{Deserialize, Serialize};

use std::time::Duration;

use super::prompts::{Persona, DREAM_ANALYSIS_PROMPT};
use super::session::{ChatMessage, Role};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";
/// A hung upstream request must not hold a page (or a session lock user)
/// hostage; after this the caller gets the fallback text.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// First `n` characters of `s`, safe on multi-byte text.
pub fn truncate_chars(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

pub fn fallback_dream_analysis(dream_text: &str) -> String {
    format!(
        "AI servisi geçici olarak kullanılamıyor. (Fallback) Rüyanız: {}...",
        truncate_chars(dream_text, 100)
    )
}

pub fn fallback_persona_reply(persona: Persona, user_input: &str) -> String {
    format!(
        "{} (fallback): Şu anda AI servisi kullanılamıyor. Sorunuz: {}...",
        persona.name(),
        truncate_chars(user_input, 100)
    )
}

#[derive(Debug)]
pub enum GeminiError {
    MissingApiKey,
    Request(reqwest::Error),
    Api { status: u16, body: String },
    EmptyResponse,
}

#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Reads `GEMINI_API_KEY` from the environment / `.env` file. A missing
    /// key is not an error; the client then always answers with fallbacks.
    pub fn from_env() -> Self {
        Self::new(dotenv::var("GEMINI_API_KEY").ok())
    }

    /// Analyzes a dream in a single request with the fixed analyst prompt.
    pub async fn analyze_dream(&self, dream_text: &str) -> String {
        if dream_text.trim().is_empty() {
            return "Lütfen analiz için bir rüya metni girin.".to_string();
        }

        let prompt = DREAM_ANALYSIS_PROMPT.replace("{dream_text}", dream_text);
        let turns = [ChatMessage::user(prompt)];

        match self.generate(None, &turns).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("dream analysis request failed, using fallback: {:?}", e);
                fallback_dream_analysis(dream_text)
            }
        }
    }

    /// Single-shot in-persona reply, without any conversation history.
    pub async fn persona_reply(&self, persona: Persona, user_input: &str) -> String {
        if user_input.trim().is_empty() {
            return "Lütfen bir mesaj girin.".to_string();
        }

        let turns = [ChatMessage::user(user_input.to_string())];

        match self.generate(Some(persona.instruction()), &turns).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("persona reply request failed, using fallback: {:?}", e);
                fallback_persona_reply(persona, user_input)
            }
        }
    }

    /// Issues one generateContent request with the given system instruction
    /// and conversation turns.
    pub(super) async fn generate(
        &self,
        system_instruction: Option<&str>,
        turns: &[ChatMessage],
    ) -> Result<String, GeminiError> {
        let api_key = self.api_key.as_ref().ok_or(GeminiError::MissingApiKey)?;

        let request = GenerateContentRequest {
            contents: turns
                .iter()
                .map(|turn| Content {
                    role: match turn.role {
                        Role::User => "user",
                        Role::Model => "model",
                    },
                    parts: vec![Part {
                        text: turn.content.clone(),
                    }],
                })
                .collect(),
            system_instruction: system_instruction.map(|text| SystemInstruction {
                parts: vec![Part {
                    text: text.to_string(),
                }],
            }),
        };

        let url = format!(
            "{}/{}:generateContent?key={}",
            BASE_URL, self.model, api_key
        );

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(GeminiError::Request)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GeminiError::Api { status, body });
        }

        let parsed: GenerateContentResponse =
            response.json().await.map_err(GeminiError::Request)?;

        parsed
            .candidates
            .and_then(|mut candidates| candidates.pop())
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
            .filter(|text| !text.is_empty())
            .ok_or(GeminiError::EmptyResponse)
    }
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serialization_matches_the_wire_format() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: "merhaba".to_string(),
                }],
            }],
            system_instruction: Some(SystemInstruction {
                parts: vec![Part {
                    text: "talimat".to_string(),
                }],
            }),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "merhaba");
        assert_eq!(value["system_instruction"]["parts"][0]["text"], "talimat");

        let bare = GenerateContentRequest {
            contents: vec![],
            system_instruction: None,
        };
        let value = serde_json::to_value(&bare).unwrap();
        assert!(value.get("system_instruction").is_none());
    }

    #[test]
    fn truncation_is_char_safe() {
        let text = "ü".repeat(150);
        let truncated = truncate_chars(&text, 100);
        assert_eq!(truncated.chars().count(), 100);
    }

    #[tokio::test]
    async fn missing_key_falls_back_for_dream_analysis() {
        let client = GeminiClient::new(None);
        let result = client.analyze_dream("Uçtuğumu gördüm").await;
        assert!(result.contains("Fallback"));
        assert!(result.contains("Uçtuğumu gördüm"));
    }

    #[tokio::test]
    async fn missing_key_falls_back_for_persona_reply() {
        let client = GeminiClient::new(None);
        let result = client
            .persona_reply(Persona::SherlockHolmes, "Uyuyamıyorum")
            .await;
        assert!(result.starts_with("Sherlock Holmes (fallback)"));
        assert!(result.contains("Uyuyamıyorum"));
    }

    #[tokio::test]
    async fn empty_input_is_rejected_before_any_request() {
        let client = GeminiClient::new(None);
        assert_eq!(
            client.analyze_dream("   ").await,
            "Lütfen analiz için bir rüya metni girin."
        );
        assert_eq!(
            client.persona_reply(Persona::Yilmaz, "").await,
            "Lütfen bir mesaj girin."
        );
    }

    #[tokio::test]
    async fn blank_key_counts_as_missing() {
        let client = GeminiClient::new(Some("   ".to_string()));
        let result = client.analyze_dream("kısa rüya").await;
        assert!(result.contains("Fallback"));
    }
}
