use chrono::{DateTime, Utc};

/// Prefix every user-visible failure message starts with.
pub const ERROR_PREFIX: &str = "Error: ";

/// Text shown in the placeholder while a deferred job is outstanding.
pub const STATUS_TEXT: &str = "Working on your answer...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub is_status: bool,
}

impl Message {
    /// Errors are ordinary assistant messages; the prefix is what marks them.
    pub fn is_error(&self) -> bool {
        self.sender == Sender::Assistant && is_error_text(&self.text)
    }
}

pub fn is_error_text(text: &str) -> bool {
    text.starts_with(ERROR_PREFIX)
}
