//! Askdesk core: pure conversation state machine, answer normalization and
//! citation parsing.
mod content;
mod conversation;
mod effect;
mod job;
mod message;
mod msg;
mod normalize;
mod state;
mod update;
mod view_model;

pub use content::{parse_message_content, plain_text, ContentSegment};
pub use conversation::Conversation;
pub use effect::Effect;
pub use job::{ChatError, JobId, JobOutcome, JobStatus};
pub use message::{is_error_text, Message, MessageId, Sender, ERROR_PREFIX, STATUS_TEXT};
pub use msg::Msg;
pub use normalize::{normalize_response, ResponseEnvelope};
pub use state::AppState;
pub use update::update;
pub use view_model::{AppViewModel, MessageView};
