use thiserror::Error;

use crate::conversation::ConversationId;

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("invalid script: {0}")]
    Script(#[from] toml::de::Error),
    #[error("unknown conversation: {0}")]
    UnknownConversation(ConversationId),
    #[error("cannot send an empty message")]
    EmptyMessage,
}
