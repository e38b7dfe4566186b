use super::types::{AvatarEmotion, Message, MessageDraft, Sender};
use crate::theme::ThemePreference;
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Default)]
struct StoreInner {
    messages: Vec<Message>,
    is_loading: bool,
    is_listening: bool,
    emotion: AvatarEmotion,
    theme: ThemePreference,
}

/// Single in-memory authority over the conversation. Cheap to clone; all
/// clones share the same state, and every operation is atomic under the
/// inner lock.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    inner: Arc<RwLock<StoreInner>>,
}

/// Point-in-time copy of the whole conversation state.
#[derive(Debug, Clone)]
pub struct ConversationSnapshot {
    pub messages: Vec<Message>,
    pub is_loading: bool,
    pub is_listening: bool,
    pub emotion: AvatarEmotion,
    pub theme: ThemePreference,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message at the tail, assigning its id and timestamp.
    pub fn append(&self, draft: MessageDraft) -> Uuid {
        let message = Message {
            id: Uuid::new_v4(),
            sender: draft.sender,
            text: draft.text,
            timestamp: Utc::now(),
            is_typing: draft.is_typing,
            audio: draft.audio,
        };
        let id = message.id;
        self.inner.write().messages.push(message);
        id
    }

    /// Set the tail message's text and clear its typing flag, if the tail
    /// is an assistant message. No-op otherwise.
    pub fn replace_last_assistant_text(&self, text: &str) {
        let mut inner = self.inner.write();
        if let Some(last) = inner.messages.last_mut() {
            if last.sender == Sender::Assistant {
                last.text = text.to_owned();
                last.is_typing = false;
            }
        }
    }

    /// Append a streaming fragment to the tail assistant message, leaving
    /// its typing flag untouched. No-op if the tail is not an assistant
    /// message.
    pub fn append_to_last_assistant(&self, fragment: &str) {
        let mut inner = self.inner.write();
        if let Some(last) = inner.messages.last_mut() {
            if last.sender == Sender::Assistant {
                last.text.push_str(fragment);
            }
        }
    }

    pub fn set_loading(&self, loading: bool) {
        self.inner.write().is_loading = loading;
    }

    pub fn set_listening(&self, listening: bool) {
        self.inner.write().is_listening = listening;
    }

    pub fn set_emotion(&self, emotion: AvatarEmotion) {
        self.inner.write().emotion = emotion;
    }

    pub fn set_theme(&self, theme: ThemePreference) {
        self.inner.write().theme = theme;
    }

    /// Empty the message list. Flags and theme are unaffected.
    pub fn clear(&self) {
        self.inner.write().messages.clear();
    }

    pub fn messages(&self) -> Vec<Message> {
        self.inner.read().messages.clone()
    }

    pub fn get(&self, id: Uuid) -> Option<Message> {
        self.inner.read().messages.iter().find(|m| m.id == id).cloned()
    }

    pub fn snapshot(&self) -> ConversationSnapshot {
        let inner = self.inner.read();
        ConversationSnapshot {
            messages: inner.messages.clone(),
            is_loading: inner.is_loading,
            is_listening: inner.is_listening,
            emotion: inner.emotion,
            theme: inner.theme,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().messages.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.read().is_loading
    }

    pub fn is_listening(&self) -> bool {
        self.inner.read().is_listening
    }

    pub fn emotion(&self) -> AvatarEmotion {
        self.inner.read().emotion
    }

    pub fn theme(&self) -> ThemePreference {
        self.inner.read().theme
    }
}
