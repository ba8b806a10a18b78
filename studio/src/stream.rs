//! Word-by-word streaming of a scripted reply.
//!
//! Each stream is a spawned task owned through a [`StreamTask`] handle. The
//! handle cancels its token and aborts the task when dropped, so replacing or
//! discarding it always stops the stream. The task only holds a weak
//! reference to the studio state and re-checks its token under the state lock
//! before every append, so a cancelled stream never mutates its message again.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::conversation::{ConversationId, MessageId};
use crate::studio::Inner;

/// Public view of the studio's streaming slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StreamState {
    Idle,
    Streaming { message_id: MessageId },
    Done { message_id: MessageId },
}

/// Notifications published while a reply streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StreamEvent {
    Chunk { message_id: MessageId, text: String },
    Finished { message_id: MessageId },
    Cancelled { message_id: MessageId },
}

/// The studio's single streaming slot. The running task's handle lives in
/// the `Streaming` variant, so there is never more than one.
#[derive(Debug)]
pub(crate) enum StreamSlot {
    Idle,
    Streaming(StreamTask),
    Done(MessageId),
}

impl StreamSlot {
    pub fn state(&self) -> StreamState {
        match self {
            StreamSlot::Idle => StreamState::Idle,
            StreamSlot::Streaming(task) => StreamState::Streaming {
                message_id: task.message_id,
            },
            StreamSlot::Done(message_id) => StreamState::Done {
                message_id: *message_id,
            },
        }
    }
}

/// Owning handle for one spawned stream.
#[derive(Debug)]
pub(crate) struct StreamTask {
    pub conversation: ConversationId,
    pub message_id: MessageId,
    token: CancellationToken,
    join: Option<JoinHandle<()>>,
}

impl StreamTask {
    /// Release the handle without aborting; used by the task itself once it
    /// has finished its last append.
    fn detach(mut self) {
        self.join.take();
    }
}

impl Drop for StreamTask {
    fn drop(&mut self) {
        self.token.cancel();
        if let Some(join) = self.join.take() {
            join.abort();
        }
    }
}

/// Counts stream task futures that have not yet been dropped.
#[derive(Debug, Clone, Default)]
pub(crate) struct ActiveStreams(Arc<AtomicUsize>);

impl ActiveStreams {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn enter(&self) -> ActiveGuard {
        self.0.fetch_add(1, Ordering::SeqCst);
        ActiveGuard(self.0.clone())
    }
}

struct ActiveGuard(Arc<AtomicUsize>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Split `content` into chunks of one word plus its trailing whitespace
/// (leading whitespace stays with the first word). Concatenating the chunks
/// yields `content` unchanged.
pub fn split_words(content: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut in_space = false;
    let mut seen_word = false;
    for (i, c) in content.char_indices() {
        if c.is_whitespace() {
            in_space = true;
            continue;
        }
        if in_space && seen_word {
            chunks.push(&content[start..i]);
            start = i;
        }
        in_space = false;
        seen_word = true;
    }
    if start < content.len() {
        chunks.push(&content[start..]);
    }
    chunks
}

pub(crate) struct StreamSpec {
    pub conversation: ConversationId,
    pub message_id: MessageId,
    pub content: String,
    pub interval: Duration,
}

/// Spawn the streaming task for `spec`. Must be called inside a tokio runtime.
pub(crate) fn spawn_stream(
    shared: Weak<Mutex<Inner>>,
    spec: StreamSpec,
    events: broadcast::Sender<StreamEvent>,
    active: &ActiveStreams,
) -> StreamTask {
    let token = CancellationToken::new();
    let guard = active.enter();
    let conversation = spec.conversation;
    let message_id = spec.message_id;
    let join = tokio::spawn(run_stream(shared, spec, token.clone(), events, guard));
    debug!(%message_id, "stream started");
    StreamTask {
        conversation,
        message_id,
        token,
        join: Some(join),
    }
}

async fn run_stream(
    shared: Weak<Mutex<Inner>>,
    spec: StreamSpec,
    token: CancellationToken,
    events: broadcast::Sender<StreamEvent>,
    _guard: ActiveGuard,
) {
    let StreamSpec {
        conversation,
        message_id,
        content,
        interval,
    } = spec;

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; the first word waits one interval.
    ticker.tick().await;

    for chunk in split_words(&content) {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = ticker.tick() => {}
        }

        let Some(shared) = shared.upgrade() else {
            return;
        };
        let mut inner = shared.lock().await;
        if token.is_cancelled() {
            return;
        }
        let Some(message) = inner.message_mut(conversation, message_id) else {
            return;
        };
        message.content.push_str(chunk);
        let _ = events.send(StreamEvent::Chunk {
            message_id,
            text: chunk.to_string(),
        });
    }

    let Some(shared) = shared.upgrade() else {
        return;
    };
    let mut inner = shared.lock().await;
    if token.is_cancelled() {
        return;
    }
    if let Some(message) = inner.message_mut(conversation, message_id) {
        message.streaming = false;
    }
    let still_current =
        matches!(&inner.slot, StreamSlot::Streaming(task) if task.message_id == message_id);
    if still_current {
        if let StreamSlot::Streaming(task) =
            std::mem::replace(&mut inner.slot, StreamSlot::Done(message_id))
        {
            task.detach();
        }
    }
    debug!(%message_id, "stream finished");
    let _ = events.send(StreamEvent::Finished { message_id });
}
