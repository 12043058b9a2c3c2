use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A single turn of the conversation as exchanged with the client and the provider
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new<S: Into<String>>(role: Role, content: S) -> Self {
        ChatMessage {
            role,
            content: content.into(),
        }
    }

    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system<S: Into<String>>(content: S) -> Self {
        Self::new(Role::System, content)
    }
}

/// Inbound chat payload. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub network: Option<bool>,
    #[serde(default)]
    pub model: Option<String>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            network: None,
            model: None,
        }
    }

    pub fn with_network(mut self, network: bool) -> Self {
        self.network = Some(network);
        self
    }

    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Content of the last message, the only one ever rewritten
    pub fn current_input(&self) -> Option<&str> {
        self.messages
            .last()
            .map(|message| message.content.as_str())
            .filter(|content| !content.is_empty())
    }

    pub fn uses_network(&self) -> bool {
        self.network.unwrap_or(false)
    }
}
