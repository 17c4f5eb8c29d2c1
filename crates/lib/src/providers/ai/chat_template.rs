//! ChatML rendering for instruction-tuned models served as raw completion endpoints.

use serde::{Deserialize, Serialize};

/// A role-tagged message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// The token that closes every ChatML turn. Also used as a stop sequence.
pub const IM_END: &str = "<|im_end|>";

/// Renders messages as `<|im_start|>{role}\n{content}<|im_end|>\n` blocks followed by an
/// open assistant turn.
pub fn format_chat(messages: &[ChatMessage]) -> String {
    let mut text = String::new();
    for msg in messages {
        text.push_str(&format!(
            "<|im_start|>{}\n{}{IM_END}\n",
            msg.role, msg.content
        ));
    }
    text.push_str("<|im_start|>assistant\n");
    text
}
