use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.content.as_deref().unwrap_or_default().is_empty()
            && self.reasoning_content.as_deref().unwrap_or_default().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub delta: Delta,
}

/// One `data:` payload of the chat-completions event stream.
///
/// Providers send many more fields (ids, roles, finish reasons, usage); only the
/// delta tokens survive deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEvent {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

impl StreamEvent {
    pub fn content<S: Into<String>>(text: S) -> Self {
        Self::from_delta(Delta {
            content: Some(text.into()),
            reasoning_content: None,
        })
    }

    pub fn reasoning<S: Into<String>>(text: S) -> Self {
        Self::from_delta(Delta {
            content: None,
            reasoning_content: Some(text.into()),
        })
    }

    pub fn from_delta(delta: Delta) -> Self {
        Self {
            choices: vec![Choice { delta }],
        }
    }

    /// Delta of the first choice; later choices are never requested
    pub fn delta(&self) -> Option<&Delta> {
        self.choices.first().map(|choice| &choice.delta)
    }
}
