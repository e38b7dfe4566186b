use crate::AuraError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    User,
    Assistant,
}

/// UI-facing projection of the current orchestration phase. Not a semantic
/// analysis of message content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvatarEmotion {
    #[default]
    Neutral,
    Happy,
    Thinking,
    Speaking,
    Listening,
}

impl AvatarEmotion {
    /// Every emotion, in showcase order.
    pub fn all() -> [AvatarEmotion; 5] {
        [
            AvatarEmotion::Neutral,
            AvatarEmotion::Happy,
            AvatarEmotion::Thinking,
            AvatarEmotion::Speaking,
            AvatarEmotion::Listening,
        ]
    }
}

impl fmt::Display for AvatarEmotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AvatarEmotion::Neutral => "neutral",
            AvatarEmotion::Happy => "happy",
            AvatarEmotion::Thinking => "thinking",
            AvatarEmotion::Speaking => "speaking",
            AvatarEmotion::Listening => "listening",
        };
        write!(f, "{name}")
    }
}

impl FromStr for AvatarEmotion {
    type Err = AuraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "neutral" => Ok(AvatarEmotion::Neutral),
            "happy" => Ok(AvatarEmotion::Happy),
            "thinking" => Ok(AvatarEmotion::Thinking),
            "speaking" => Ok(AvatarEmotion::Speaking),
            "listening" => Ok(AvatarEmotion::Listening),
            other => Err(AuraError::Config(format!("Unknown emotion: {other}"))),
        }
    }
}

/// A single transcript entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// True only while this entry is the in-flight assistant placeholder.
    pub is_typing: bool,
    /// Path to the captured recording a voice message came from.
    pub audio: Option<PathBuf>,
}

impl Message {
    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}

/// A message before the store assigns its id and timestamp.
#[derive(Debug, Clone)]
pub struct MessageDraft {
    pub sender: Sender,
    pub text: String,
    pub is_typing: bool,
    pub audio: Option<PathBuf>,
}

impl MessageDraft {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            is_typing: false,
            audio: None,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Assistant,
            text: text.into(),
            is_typing: false,
            audio: None,
        }
    }

    /// The provisional assistant entry shown while a reply is awaited.
    pub fn typing_placeholder() -> Self {
        Self {
            sender: Sender::Assistant,
            text: String::new(),
            is_typing: true,
            audio: None,
        }
    }

    pub fn with_audio(mut self, path: impl Into<PathBuf>) -> Self {
        self.audio = Some(path.into());
        self
    }
}
