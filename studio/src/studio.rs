use std::sync::Arc;

use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info};

use crate::config::StudioConfig;
use crate::conversation::{Conversation, ConversationId, Message, MessageId, Role};
use crate::error::StudioError;
use crate::script::Script;
use crate::stream::{
    ActiveStreams, StreamEvent, StreamSlot, StreamSpec, StreamState, spawn_stream,
};

const EVENT_CAPACITY: usize = 256;

/// The Agreement Studio chat prototype.
///
/// Replies come from a [`Script`] and stream into the active conversation one
/// word per tick. Only one reply streams at a time: sending a message,
/// switching conversations or starting a new one cancels the stream in
/// flight first. Dropping the studio stops any running stream.
pub struct Studio {
    shared: Arc<Mutex<Inner>>,
    script: Script,
    config: StudioConfig,
    events: broadcast::Sender<StreamEvent>,
    active: ActiveStreams,
}

pub(crate) struct Inner {
    conversations: Vec<Conversation>,
    current: ConversationId,
    next_message: u64,
    next_conversation: u64,
    pub(crate) slot: StreamSlot,
}

impl Inner {
    pub(crate) fn message_mut(
        &mut self,
        conversation: ConversationId,
        message: MessageId,
    ) -> Option<&mut Message> {
        self.conversations
            .iter_mut()
            .find(|c| c.id == conversation)
            .and_then(|c| c.message_mut(message))
    }

    fn conversation(&self, id: ConversationId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    fn conversation_mut(&mut self, id: ConversationId) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| c.id == id)
    }

    fn next_message_id(&mut self) -> MessageId {
        self.next_message += 1;
        MessageId(self.next_message)
    }

    fn add_conversation(&mut self, title: &str) -> ConversationId {
        self.next_conversation += 1;
        let id = ConversationId(self.next_conversation);
        self.conversations.push(Conversation::new(id, title));
        id
    }

    /// Stop the stream in flight, if any. The partial reply stays as written.
    fn cancel_stream(&mut self, events: &broadcast::Sender<StreamEvent>) {
        let StreamSlot::Streaming(task) = std::mem::replace(&mut self.slot, StreamSlot::Idle)
        else {
            return;
        };
        let conversation = task.conversation;
        let message_id = task.message_id;
        drop(task);
        if let Some(message) = self.message_mut(conversation, message_id) {
            message.streaming = false;
        }
        debug!(%message_id, "stream cancelled");
        let _ = events.send(StreamEvent::Cancelled { message_id });
    }
}

impl Studio {
    pub fn new(script: Script, config: StudioConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let mut inner = Inner {
            conversations: Vec::new(),
            current: ConversationId(0),
            next_message: 0,
            next_conversation: 0,
            slot: StreamSlot::Idle,
        };
        inner.current = inner.add_conversation("New conversation");
        Studio {
            shared: Arc::new(Mutex::new(inner)),
            script,
            config,
            events,
            active: ActiveStreams::default(),
        }
    }

    /// Receive chunk, finish and cancel notifications from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<StreamEvent> {
        self.events.subscribe()
    }

    /// Post a user message and start streaming the scripted reply.
    /// Returns the id of the reply message.
    pub async fn send(&self, text: &str) -> Result<MessageId, StudioError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(StudioError::EmptyMessage);
        }
        let reply = self.script.respond(text);

        let mut inner = self.shared.lock().await;
        inner.cancel_stream(&self.events);

        let conversation = inner.current;
        let user_id = inner.next_message_id();
        let reply_id = inner.next_message_id();
        let Some(conv) = inner.conversation_mut(conversation) else {
            return Err(StudioError::UnknownConversation(conversation));
        };
        conv.messages.push(Message {
            id: user_id,
            role: Role::User,
            content: text.to_string(),
            citations: Default::default(),
            streaming: false,
        });
        conv.messages.push(Message {
            id: reply_id,
            role: Role::Assistant,
            content: String::new(),
            citations: reply.citations,
            streaming: true,
        });

        let spec = StreamSpec {
            conversation,
            message_id: reply_id,
            content: reply.content,
            interval: self.config.word_interval(),
        };
        let task = spawn_stream(
            Arc::downgrade(&self.shared),
            spec,
            self.events.clone(),
            &self.active,
        );
        inner.slot = StreamSlot::Streaming(task);
        Ok(reply_id)
    }

    /// Start a fresh conversation and make it current.
    pub async fn new_conversation(&self, title: &str) -> ConversationId {
        let mut inner = self.shared.lock().await;
        inner.cancel_stream(&self.events);
        let id = inner.add_conversation(title);
        inner.current = id;
        info!(conversation = %id, "conversation created");
        id
    }

    /// Make `id` the current conversation, cancelling any stream in flight.
    pub async fn switch_conversation(&self, id: ConversationId) -> Result<(), StudioError> {
        let mut inner = self.shared.lock().await;
        if inner.conversation(id).is_none() {
            return Err(StudioError::UnknownConversation(id));
        }
        inner.cancel_stream(&self.events);
        inner.current = id;
        Ok(())
    }

    /// Stop the stream in flight, if any.
    pub async fn cancel(&self) {
        self.shared.lock().await.cancel_stream(&self.events);
    }

    pub async fn current_conversation(&self) -> ConversationId {
        self.shared.lock().await.current
    }

    pub async fn conversation(&self, id: ConversationId) -> Option<Conversation> {
        self.shared.lock().await.conversation(id).cloned()
    }

    pub async fn conversations(&self) -> Vec<Conversation> {
        self.shared.lock().await.conversations.clone()
    }

    /// Messages of the current conversation.
    pub async fn messages(&self) -> Vec<Message> {
        let inner = self.shared.lock().await;
        inner
            .conversation(inner.current)
            .map(|c| c.messages.clone())
            .unwrap_or_default()
    }

    /// Find a message in any conversation.
    pub async fn message(&self, id: MessageId) -> Option<Message> {
        let inner = self.shared.lock().await;
        inner
            .conversations
            .iter()
            .find_map(|c| c.message(id))
            .cloned()
    }

    pub async fn stream_state(&self) -> StreamState {
        self.shared.lock().await.slot.state()
    }

    /// Number of stream tasks still alive, cancelled ones included until the
    /// runtime has dropped them.
    pub fn active_streams(&self) -> usize {
        self.active.get()
    }

    /// Wait until no reply is streaming.
    pub async fn wait_idle(&self) {
        let mut events = self.events.subscribe();
        loop {
            if !matches!(self.stream_state().await, StreamState::Streaming { .. }) {
                return;
            }
            if let Err(broadcast::error::RecvError::Closed) = events.recv().await {
                return;
            }
        }
    }
}
