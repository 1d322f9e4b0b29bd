use std::collections::HashMap;

use chrono::Utc;

use crate::message::{Message, MessageId, Sender, STATUS_TEXT};
use crate::JobId;

/// Ordered message log of one conversation.
///
/// Messages are only ever appended. The single exception is a status
/// placeholder, which is swapped in place for its terminal message exactly
/// once via [`Conversation::replace_status`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    next_id: u64,
    status_slots: HashMap<JobId, MessageId>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|message| message.id == id)
    }

    pub fn append_user(&mut self, text: impl Into<String>) -> MessageId {
        self.append(Sender::User, text.into(), false)
    }

    pub fn append_assistant(&mut self, text: impl Into<String>) -> MessageId {
        self.append(Sender::Assistant, text.into(), false)
    }

    /// Appends the placeholder for `job_id`. A job owns at most one placeholder;
    /// asking again returns the existing one.
    pub fn append_status(&mut self, job_id: JobId) -> MessageId {
        if let Some(existing) = self.status_slots.get(&job_id) {
            return *existing;
        }
        let id = self.append(Sender::Assistant, STATUS_TEXT.to_string(), true);
        self.status_slots.insert(job_id, id);
        id
    }

    pub fn has_status(&self, job_id: &JobId) -> bool {
        self.status_slots.contains_key(job_id)
    }

    /// Swaps the placeholder of `job_id` for a terminal assistant message.
    ///
    /// Returns the new message id, or `None` when the job has no placeholder
    /// (never started, or already replaced). A second call is therefore a no-op.
    pub fn replace_status(&mut self, job_id: &JobId, text: impl Into<String>) -> Option<MessageId> {
        let status_id = self.status_slots.remove(job_id)?;
        let index = self
            .messages
            .iter()
            .position(|message| message.id == status_id)?;
        let id = self.allocate_id();
        self.messages[index] = Message {
            id,
            sender: Sender::Assistant,
            text: text.into(),
            timestamp: Utc::now(),
            is_status: false,
        };
        Some(id)
    }

    fn append(&mut self, sender: Sender, text: String, is_status: bool) -> MessageId {
        let id = self.allocate_id();
        self.messages.push(Message {
            id,
            sender,
            text,
            timestamp: Utc::now(),
            is_status,
        });
        id
    }

    fn allocate_id(&mut self) -> MessageId {
        self.next_id += 1;
        MessageId(self.next_id)
    }
}
