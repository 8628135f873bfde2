//! In-memory multi-turn chat sessions.
//!
//! A session is bound to a system instruction (dream analyst or one of the
//! therapy personas) and keeps the ordered transcript of exchanged turns.
//! The full transcript is sent as history on every request, and clearing
//! discards the turns without changing the instruction.

use serde::{Deserialize, Serialize};

use super::gemini::{fallback_dream_analysis, fallback_persona_reply, GeminiClient};
use super::prompts::{Persona, DREAM_ANALYSIS_PROMPT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: String) -> Self {
        Self {
            role: Role::User,
            content,
        }
    }

    pub fn model(content: String) -> Self {
        Self {
            role: Role::Model,
            content,
        }
    }
}

/// What the session is instructed to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionInstruction {
    DreamAnalyst,
    Persona(Persona),
}

impl SessionInstruction {
    fn text(&self) -> &'static str {
        match self {
            SessionInstruction::DreamAnalyst => DREAM_ANALYSIS_PROMPT,
            SessionInstruction::Persona(persona) => persona.instruction(),
        }
    }

    fn fallback(&self, input: &str) -> String {
        match self {
            SessionInstruction::DreamAnalyst => fallback_dream_analysis(input),
            SessionInstruction::Persona(persona) => fallback_persona_reply(*persona, input),
        }
    }
}

/// Clone is cheap enough to snapshot a session out of shared state, run
/// the network turn on the copy, and store it back afterwards.
#[derive(Debug, Clone)]
pub struct ChatSession {
    instruction: SessionInstruction,
    transcript: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn for_persona(persona: Persona) -> Self {
        Self {
            instruction: SessionInstruction::Persona(persona),
            transcript: Vec::new(),
        }
    }

    pub fn dream_analyst() -> Self {
        Self {
            instruction: SessionInstruction::DreamAnalyst,
            transcript: Vec::new(),
        }
    }

    pub fn persona(&self) -> Option<Persona> {
        match self.instruction {
            SessionInstruction::Persona(persona) => Some(persona),
            SessionInstruction::DreamAnalyst => None,
        }
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Appends the user turn, requests a reply with the whole transcript as
    /// history, and appends the reply. A failed request yields fallback
    /// text, recorded in the transcript like any other reply.
    pub async fn send(&mut self, client: &GeminiClient, text: &str) -> String {
        if text.trim().is_empty() {
            return "Lütfen bir mesaj girin.".to_string();
        }

        self.transcript.push(ChatMessage::user(text.to_string()));

        let reply = match client
            .generate(Some(self.instruction.text()), &self.transcript)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("chat session request failed, using fallback: {:?}", e);
                self.instruction.fallback(text)
            }
        };

        self.transcript.push(ChatMessage::model(reply.clone()));
        reply
    }

    /// Discards the transcript; the instruction and the session stay usable.
    pub fn clear(&mut self) {
        self.transcript.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_records_both_turns() {
        let client = GeminiClient::new(None);
        let mut session = ChatSession::for_persona(Persona::RamizDayi);

        let reply = session.send(&client, "Kırgınım").await;
        assert!(reply.contains("Ramiz Dayı"));

        let transcript = session.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, Role::User);
        assert_eq!(transcript[0].content, "Kırgınım");
        assert_eq!(transcript[1].role, Role::Model);
        assert_eq!(transcript[1].content, reply);
    }

    #[tokio::test]
    async fn empty_message_leaves_transcript_untouched() {
        let client = GeminiClient::new(None);
        let mut session = ChatSession::for_persona(Persona::Yilmaz);

        session.send(&client, "  ").await;
        assert!(session.transcript().is_empty());
    }

    #[tokio::test]
    async fn clear_keeps_the_session_usable() {
        let client = GeminiClient::new(None);
        let mut session = ChatSession::for_persona(Persona::CarrieBradshaw);

        session.send(&client, "İlk mesaj").await;
        assert_eq!(session.transcript().len(), 2);

        session.clear();
        assert!(session.transcript().is_empty());
        assert_eq!(session.persona(), Some(Persona::CarrieBradshaw));

        session.send(&client, "İkinci mesaj").await;
        assert_eq!(session.transcript().len(), 2);
        assert_eq!(session.transcript()[0].content, "İkinci mesaj");
    }

    #[tokio::test]
    async fn snapshot_runs_the_turn_without_touching_the_original() {
        let client = GeminiClient::new(None);
        let mut session = ChatSession::for_persona(Persona::IsmailAbi);
        session.send(&client, "Merhaba").await;

        // the handler pattern: copy out, send on the copy, store it back
        let mut snapshot = session.clone();
        snapshot.send(&client, "Uyku düzenim bozuk").await;

        assert_eq!(session.transcript().len(), 2);
        assert_eq!(snapshot.transcript().len(), 4);
        assert_eq!(snapshot.persona(), Some(Persona::IsmailAbi));
        assert_eq!(snapshot.transcript()[2].content, "Uyku düzenim bozuk");

        session = snapshot;
        assert_eq!(session.transcript().len(), 4);
    }

    #[tokio::test]
    async fn dream_analyst_session_uses_dream_fallback() {
        let client = GeminiClient::new(None);
        let mut session = ChatSession::dream_analyst();

        let reply = session.send(&client, "Denizde yüzüyordum").await;
        assert!(reply.contains("Rüyanız: Denizde yüzüyordum"));
    }
}
