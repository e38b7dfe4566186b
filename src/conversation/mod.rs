pub mod store;
pub mod types;

pub use store::{ConversationSnapshot, ConversationStore};
pub use types::{AvatarEmotion, Message, MessageDraft, Sender};
