use std::sync::LazyLock;

use regex::Regex;

/// `[source: free text]`, keyword case-insensitive. Brackets are not allowed
/// inside the free text, so an unterminated marker never swallows the next one.
static CITATION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[source:([^\[\]]*)\]").expect("citation marker pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSegment {
    Text { value: String },
    Citation { value: String },
}

impl ContentSegment {
    pub fn text(value: impl Into<String>) -> Self {
        ContentSegment::Text {
            value: value.into(),
        }
    }

    pub fn citation(value: impl Into<String>) -> Self {
        ContentSegment::Citation {
            value: value.into(),
        }
    }

    pub fn value(&self) -> &str {
        match self {
            ContentSegment::Text { value } | ContentSegment::Citation { value } => value,
        }
    }

    pub fn is_citation(&self) -> bool {
        matches!(self, ContentSegment::Citation { .. })
    }

    /// Line pieces of the segment; a renderer emits a hard break between them.
    /// Citations are always a single piece.
    pub fn lines(&self) -> Vec<&str> {
        match self {
            ContentSegment::Text { value } => value
                .split('\n')
                .map(|line| line.strip_suffix('\r').unwrap_or(line))
                .collect(),
            ContentSegment::Citation { value } => vec![value.as_str()],
        }
    }
}

/// Splits answer text into text and citation segments.
///
/// The result always alternates `Text, Citation, ..., Text`: `n` markers give
/// `2n + 1` segments, and empty text between adjacent markers is kept.
pub fn parse_message_content(text: &str) -> Vec<ContentSegment> {
    let mut segments = Vec::new();
    let mut cursor = 0;
    for captures in CITATION_MARKER.captures_iter(text) {
        let (Some(whole), Some(inner)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        segments.push(ContentSegment::text(&text[cursor..whole.start()]));
        segments.push(ContentSegment::citation(inner.as_str().trim()));
        cursor = whole.end();
    }
    segments.push(ContentSegment::text(&text[cursor..]));
    segments
}

/// Concatenates the text segments back into the marker-free source text.
pub fn plain_text(segments: &[ContentSegment]) -> String {
    segments
        .iter()
        .filter(|segment| !segment.is_citation())
        .map(ContentSegment::value)
        .collect()
}
