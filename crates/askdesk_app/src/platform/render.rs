use std::collections::HashSet;
use std::io::{self, Write};

use askdesk_core::{AppViewModel, ContentSegment, MessageId, MessageView, Sender};
use chrono::Local;

const CONTINUATION_INDENT: &str = "      ";

/// Prints each message once. A replaced placeholder has a fresh id, so its
/// terminal form is printed when it appears.
pub struct Renderer<W: Write> {
    out: W,
    shown: HashSet<MessageId>,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            shown: HashSet::new(),
        }
    }

    pub fn render(&mut self, view: &AppViewModel) -> io::Result<()> {
        for message in &view.messages {
            if self.shown.insert(message.id) {
                writeln!(self.out, "{}", format_message(message))?;
            }
        }
        self.out.flush()
    }

    pub fn notice(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "  ({text})")?;
        self.out.flush()
    }
}

pub fn format_message(message: &MessageView) -> String {
    let time = message.timestamp.with_timezone(&Local).format("%H:%M");
    let label = match (message.sender, message.is_status, message.is_error) {
        (Sender::User, _, _) => "you",
        (Sender::Assistant, true, _) => "....",
        (Sender::Assistant, false, true) => "err",
        (Sender::Assistant, false, false) => "bot",
    };

    let line_break = format!("\n{CONTINUATION_INDENT}");
    let mut body = String::new();
    let mut sources = Vec::new();
    for segment in &message.segments {
        match segment {
            ContentSegment::Text { .. } => {
                body.push_str(&segment.lines().join(line_break.as_str()));
            }
            ContentSegment::Citation { value } => {
                sources.push(value.as_str());
                body.push_str(&format!("[{}]", sources.len()));
            }
        }
    }

    let mut rendered = format!("{time} {label:>4}> {body}");
    for (index, source) in sources.iter().enumerate() {
        rendered.push_str(&format!("\n{CONTINUATION_INDENT}[{}] {source}", index + 1));
    }
    rendered
}
