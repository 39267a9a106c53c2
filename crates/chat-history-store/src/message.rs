//! Chat message model and its stored JSON form.
//!
//! Each row's `data` column holds one message as
//! `{"type": "human", "data": {"content": "...", "additional_kwargs": {...}}}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    Ai,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Ai => "ai",
            Self::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Message body shared by every role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageData {
    pub content: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub additional_kwargs: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl MessageData {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            additional_kwargs: Map::new(),
            name: None,
        }
    }
}

/// A single chat turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ChatMessage {
    Human(MessageData),
    Ai(MessageData),
    System(MessageData),
}

impl ChatMessage {
    pub fn human(content: impl Into<String>) -> Self {
        Self::Human(MessageData::new(content))
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self::Ai(MessageData::new(content))
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::System(MessageData::new(content))
    }

    pub fn new(role: Role, content: impl Into<String>) -> Self {
        let data = MessageData::new(content);
        match role {
            Role::Human => Self::Human(data),
            Role::Ai => Self::Ai(data),
            Role::System => Self::System(data),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Self::Human(_) => Role::Human,
            Self::Ai(_) => Role::Ai,
            Self::System(_) => Role::System,
        }
    }

    pub fn data(&self) -> &MessageData {
        match self {
            Self::Human(data) | Self::Ai(data) | Self::System(data) => data,
        }
    }

    pub fn content(&self) -> &str {
        &self.data().content
    }

    pub fn additional_kwargs(&self) -> &Map<String, Value> {
        &self.data().additional_kwargs
    }

    /// Attach an extra keyword argument carried alongside the content.
    pub fn with_kwarg(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data_mut().additional_kwargs.insert(key.into(), value);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.data_mut().name = Some(name.into());
        self
    }

    fn data_mut(&mut self) -> &mut MessageData {
        match self {
            Self::Human(data) | Self::Ai(data) | Self::System(data) => data,
        }
    }

    /// Serialize into the text stored in the `data` column.
    pub fn to_stored(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse the text stored in the `data` column.
    pub fn from_stored(stored: &str) -> serde_json::Result<Self> {
        serde_json::from_str(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stored_shape() {
        let stored = ChatMessage::human("hi").to_stored().unwrap();
        let value: Value = serde_json::from_str(&stored).unwrap();
        assert_eq!(value, json!({"type": "human", "data": {"content": "hi"}}));

        let stored = ChatMessage::ai("whats up?")
            .with_kwarg("model", json!("gpt"))
            .to_stored()
            .unwrap();
        let value: Value = serde_json::from_str(&stored).unwrap();
        assert_eq!(
            value,
            json!({"type": "ai", "data": {"content": "whats up?", "additional_kwargs": {"model": "gpt"}}})
        );
    }

    #[test]
    fn test_reads_payloads_with_extra_fields() {
        let stored = r#"{"type":"system","data":{"content":"be brief","additional_kwargs":{},"response_metadata":{},"id":null,"example":false}}"#;
        let message = ChatMessage::from_stored(stored).unwrap();
        assert_eq!(message.role(), Role::System);
        assert_eq!(message.content(), "be brief");
        assert!(message.additional_kwargs().is_empty());
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let stored = r#"{"type":"tool","data":{"content":"x"}}"#;
        assert!(ChatMessage::from_stored(stored).is_err());
    }

    #[test]
    fn test_control_characters_survive() {
        let content = "tab\tnewline\nreturn\rvt\x0bff\x0c\"quoted\" \\ unicode é 🙂";
        let message = ChatMessage::new(Role::Human, content).with_name("alice");
        let back = ChatMessage::from_stored(&message.to_stored().unwrap()).unwrap();
        assert_eq!(back, message);
        assert_eq!(back.content(), content);
        assert_eq!(back.data().name.as_deref(), Some("alice"));
    }
}
