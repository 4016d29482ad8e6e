// src/session.rs
// Client-side conversation state: which document is active and what has been
// said. Nothing here is persisted; dropping the session loses the history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const GREETING: &str = "Hello! Upload a PDF and I'll help you with questions about it.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Document lifecycle: `NoDocument -> Uploaded -> Ready`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentState {
    NoDocument,
    Uploaded { filename: String },
    Ready { filename: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("No document uploaded yet")]
    NoDocument,
    #[error("Document {0} has not been processed yet")]
    NotReady(String),
    #[error("Message is empty")]
    EmptyMessage,
}

#[derive(Debug, Clone)]
pub struct ChatSession {
    state: DocumentState,
    messages: Vec<ChatMessage>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            state: DocumentState::NoDocument,
            messages: vec![ChatMessage::new(Role::Assistant, GREETING)],
        }
    }

    pub fn state(&self) -> &DocumentState {
        &self.state
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn active_filename(&self) -> Option<&str> {
        match &self.state {
            DocumentState::NoDocument => None,
            DocumentState::Uploaded { filename } | DocumentState::Ready { filename } => {
                Some(filename)
            }
        }
    }

    /// Picking a new file drops any ready document and the conversation.
    pub fn select_file(&mut self) {
        self.state = DocumentState::NoDocument;
        self.messages = vec![ChatMessage::new(Role::Assistant, GREETING)];
    }

    /// Records a successful upload.
    pub fn mark_uploaded(&mut self, filename: impl Into<String>) {
        self.state = DocumentState::Uploaded {
            filename: filename.into(),
        };
    }

    /// Records the server's "ready" acknowledgment.
    pub fn mark_ready(&mut self) -> Result<&str, SessionError> {
        let filename = match &self.state {
            DocumentState::NoDocument => return Err(SessionError::NoDocument),
            DocumentState::Uploaded { filename } | DocumentState::Ready { filename } => {
                filename.clone()
            }
        };
        self.state = DocumentState::Ready { filename };
        Ok(self.active_filename().unwrap_or_default())
    }

    pub fn can_chat(&self) -> bool {
        matches!(self.state, DocumentState::Ready { .. })
    }

    /// Appends the user's message and returns the filename to ask about.
    pub fn begin_turn(&mut self, message: &str) -> Result<String, SessionError> {
        if message.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        let filename = match &self.state {
            DocumentState::Ready { filename } => filename.clone(),
            DocumentState::Uploaded { filename } => {
                return Err(SessionError::NotReady(filename.clone()))
            }
            DocumentState::NoDocument => return Err(SessionError::NoDocument),
        };
        self.messages.push(ChatMessage::new(Role::User, message));
        Ok(filename)
    }

    pub fn record_reply(&mut self, content: &str) -> &ChatMessage {
        let content = if content.is_empty() {
            "No response received"
        } else {
            content
        };
        self.push_assistant(content.to_string())
    }

    /// A failed turn shows up as an assistant message; earlier turns stay.
    pub fn record_error(&mut self, error: &str) -> &ChatMessage {
        self.push_assistant(format!("Error: {}", error))
    }

    fn push_assistant(&mut self, content: String) -> &ChatMessage {
        self.messages.push(ChatMessage::new(Role::Assistant, content));
        &self.messages[self.messages.len() - 1]
    }
}
