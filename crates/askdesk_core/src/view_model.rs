use chrono::{DateTime, Utc};

use crate::{parse_message_content, ContentSegment, JobId, Message, MessageId, Sender};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub messages: Vec<MessageView>,
    pub awaiting: bool,
    pub active_job: Option<JobId>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub id: MessageId,
    pub sender: Sender,
    pub segments: Vec<ContentSegment>,
    pub timestamp: DateTime<Utc>,
    pub is_status: bool,
    pub is_error: bool,
}

impl MessageView {
    pub(crate) fn from_message(message: &Message) -> Self {
        // Only resolved assistant answers carry citation markers.
        let segments = if message.sender == Sender::Assistant && !message.is_status {
            parse_message_content(&message.text)
        } else {
            vec![ContentSegment::text(message.text.clone())]
        };
        Self {
            id: message.id,
            sender: message.sender,
            segments,
            timestamp: message.timestamp,
            is_status: message.is_status,
            is_error: message.is_error(),
        }
    }

    pub fn citations(&self) -> impl Iterator<Item = &str> {
        self.segments
            .iter()
            .filter(|segment| segment.is_citation())
            .map(ContentSegment::value)
    }
}
