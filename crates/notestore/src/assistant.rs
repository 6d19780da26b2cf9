//! Requests for the optional chat assistant. The transport lives elsewhere;
//! this module only shapes what gets sent and checks what comes back.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::note::Note;
use crate::{Error, Result};

/// Longest slice of a single note sent as context.
const MAX_NOTE_CONTEXT_CHARS: usize = 4000;

const SUMMARY_PROMPT: &str = "You summarize personal notes. Reply with a short plain-text summary \
     of the note, at most three sentences, without markdown.";

const CHAT_PROMPT: &str = "You are a helpful assistant inside a note-taking app. \
     Answer using the user's notes when they are relevant.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A chat-completions style request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantRequest {
    pub messages: Vec<ChatMessage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// The remote assistant backend.
pub trait Assistant {
    fn complete(&self, request: &AssistantRequest) -> Result<String>;
}

/// Plain text of a note as the assistant should see it.
fn note_context(note: &Note) -> String {
    let mut body = notemark::strip(&note.content);
    if let Some((cut, _)) = body.char_indices().nth(MAX_NOTE_CONTEXT_CHARS) {
        body.truncate(cut);
    }

    let title = note.display_title();
    if title.is_empty() || body.starts_with(&title) {
        body
    } else {
        format!("{title}\n\n{body}")
    }
}

pub fn summarize_request(note: &Note) -> AssistantRequest {
    AssistantRequest {
        messages: vec![
            ChatMessage::system(SUMMARY_PROMPT),
            ChatMessage::user(note_context(note)),
        ],
        max_tokens: Some(200),
    }
}

/// Continue a conversation, giving the assistant the text of `context` notes.
pub fn chat_request(history: &[ChatMessage], prompt: &str, context: &[&Note]) -> AssistantRequest {
    let mut system = CHAT_PROMPT.to_string();
    for note in context {
        system.push_str("\n\n---\n");
        system.push_str(&note_context(note));
    }

    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system));
    messages.extend(
        history
            .iter()
            .filter(|m| m.role != Role::System)
            .cloned(),
    );
    messages.push(ChatMessage::user(prompt));

    AssistantRequest {
        messages,
        max_tokens: None,
    }
}

/// Ask `assistant` for a summary of `note`.
pub fn summarize(assistant: &impl Assistant, note: &Note) -> Result<String> {
    let request = summarize_request(note);
    debug!("requesting summary for note {}", note.id);

    let reply = assistant.complete(&request)?;
    let reply = reply.trim();
    if reply.is_empty() {
        return Err(Error::Assistant("empty summary".to_owned()));
    }
    Ok(reply.to_owned())
}
