pub mod config;
pub mod conversation;
pub mod error;
pub mod script;
pub mod stream;
pub mod studio;

pub use config::StudioConfig;
pub use conversation::{Conversation, ConversationId, Message, MessageId, Role};
pub use error::StudioError;
pub use script::{Script, ScriptedReply, ScriptedResponse};
pub use stream::{StreamEvent, StreamState};
pub use studio::Studio;
