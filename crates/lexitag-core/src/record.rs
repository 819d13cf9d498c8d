//! Dataset records
//!
//! One record is one line of a JSONL dataset file: an object holding a
//! `messages` array whose first two entries are the user question and the
//! assistant answer. Unknown fields are carried through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{LexitagError, Result};

/// Conversation roles understood by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single conversation turn.
///
/// Fields are kept as they arrive, in their original order, so a message
/// only changes where its content is rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Message {
    fields: Map<String, Value>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("role".to_string(), Value::String(role.as_str().to_string()));
        fields.insert("content".to_string(), Value::String(content.into()));
        Self { fields }
    }

    pub fn role(&self) -> Option<&str> {
        self.fields.get("role").and_then(Value::as_str)
    }

    /// Text content; `None` when absent or not a string
    pub fn content(&self) -> Option<&str> {
        self.fields.get("content").and_then(Value::as_str)
    }

    /// Replace the content value, keeping its position among the fields
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.fields
            .insert("content".to_string(), Value::String(content.into()));
    }

    fn is(&self, role: Role) -> bool {
        self.role() == Some(role.as_str())
    }
}

/// One dataset line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub messages: Vec<Message>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    /// Build a record from a question and its answer
    pub fn from_turns(user: impl Into<String>, assistant: impl Into<String>) -> Self {
        Self {
            messages: vec![
                Message::new(Role::User, user),
                Message::new(Role::Assistant, assistant),
            ],
            extra: Map::new(),
        }
    }

    /// Parse one JSONL line
    pub fn parse(line: &str) -> Result<Self> {
        serde_json::from_str(line).map_err(|e| LexitagError::MalformedRecord(e.to_string()))
    }

    /// Serialize back to a single JSONL line (no trailing newline).
    /// Non-ASCII text is written literally.
    pub fn to_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// The user and assistant texts, if the record is eligible for tagging.
    ///
    /// A record is eligible only when it has at least two messages and the
    /// first two are user then assistant.
    pub fn turns(&self) -> Result<(&str, &str)> {
        match self.messages.as_slice() {
            [user, assistant, ..] if user.is(Role::User) && assistant.is(Role::Assistant) => {
                match (user.content(), assistant.content()) {
                    (Some(u), Some(a)) => Ok((u, a)),
                    _ => Err(LexitagError::MalformedRecord(
                        "user or assistant message has no text content".to_string(),
                    )),
                }
            }
            [_, _, ..] => Err(LexitagError::MalformedRecord(
                "first two messages are not a user/assistant pair".to_string(),
            )),
            _ => Err(LexitagError::MalformedRecord(format!(
                "expected at least two messages, found {}",
                self.messages.len()
            ))),
        }
    }

    /// Derive a new record with the first two turns replaced.
    /// The receiver is left untouched.
    pub fn with_turns(&self, user: impl Into<String>, assistant: impl Into<String>) -> Self {
        let mut derived = self.clone();
        if let [u, a, ..] = derived.messages.as_mut_slice() {
            u.set_content(user);
            a.set_content(assistant);
        }
        derived
    }
}

// ============================================================================
// Tests
// ============================================================================
