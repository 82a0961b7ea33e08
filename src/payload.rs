use crate::parser::{parse_timestamp, Cue};

use std::borrow::Cow;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

/// One word of a cue payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadSpan {
    pub text: String,
    /// Set when an inline `<timestamp>` tag preceded this word.
    pub timing_offset: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedCue {
    pub line: usize,
    pub start: Duration,
    pub end: Duration,
    pub spans: Vec<PayloadSpan>,
}

impl NormalizedCue {
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.spans.iter().map(|s| s.text.as_str())
    }
}

fn tag_regex() -> &'static Regex {
    static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
    TAG_REGEX.get_or_init(|| Regex::new(r"<([^<>]*)>").expect("Failed to compile tag regex"))
}

/// Strips markup from the cue payload and splits it into words.
///
/// Inline timestamp tags are attached to the first word that starts after
/// them, and dropped when they fall inside a word; all other tags are dropped without splitting the surrounding word.
pub fn normalize(cue: Cue) -> NormalizedCue {
    let mut words = WordBuilder::default();
    let mut last = 0;
    for caps in tag_regex().captures_iter(&cue.text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        words.push_text(&decode_entities(&cue.text[last..whole.start()]));
        if let Some(offset) = parse_timestamp(inner.as_str().trim()) {
            words.mark(offset);
        }
        last = whole.end();
    }
    words.push_text(&decode_entities(&cue.text[last..]));

    NormalizedCue {
        line: cue.line,
        start: cue.start,
        end: cue.end,
        spans: words.finish(),
    }
}

#[derive(Default)]
struct WordBuilder {
    spans: Vec<PayloadSpan>,
    current: String,
    current_offset: Option<Duration>,
    pending_offset: Option<Duration>,
}

impl WordBuilder {
    fn push_text(&mut self, text: &str) {
        for c in text.chars() {
            if c.is_whitespace() {
                self.flush();
            } else {
                if self.current.is_empty() {
                    self.current_offset = self.pending_offset.take();
                } else {
                    // A tag inside a word does not move its start.
                    self.pending_offset = None;
                }
                self.current.push(c);
            }
        }
    }

    fn mark(&mut self, offset: Duration) {
        self.pending_offset = Some(offset);
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.spans.push(PayloadSpan {
                text: std::mem::take(&mut self.current),
                timing_offset: self.current_offset.take(),
            });
        }
    }

    fn finish(mut self) -> Vec<PayloadSpan> {
        self.flush();
        self.spans
    }
}

fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    let decoded = text
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&lrm;", "\u{200E}")
        .replace("&rlm;", "\u{200F}")
        .replace("&amp;", "&");
    Cow::Owned(decoded)
}
