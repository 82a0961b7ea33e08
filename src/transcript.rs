use crate::processor::Reconstruction;

use std::fmt;
use std::time::Duration;

/// A final, deduplicated stretch of the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub start: Duration,
    pub end: Duration,
    pub text: String,
}

impl Segment {
    pub fn duration(&self) -> Duration {
        self.end.saturating_sub(self.start)
    }
}

/// A committed word with its own timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    pub start: Duration,
    pub end: Duration,
    /// Index of the segment the word belongs to.
    pub segment: usize,
}

/// Separator used when the transcript is flattened to plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinStyle {
    #[default]
    Space,
    Newline,
}

impl JoinStyle {
    pub fn separator(self) -> &'static str {
        match self {
            JoinStyle::Space => " ",
            JoinStyle::Newline => "\n",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    segments: Vec<Segment>,
    words: Vec<Word>,
    metadata: Vec<(String, String)>,
    degraded_cues: usize,
    join: JoinStyle,
}

impl Transcript {
    pub(crate) fn new(
        reconstruction: Reconstruction,
        metadata: Vec<(String, String)>,
        join: JoinStyle,
    ) -> Self {
        Self {
            segments: reconstruction.segments,
            words: reconstruction.words,
            metadata,
            degraded_cues: reconstruction.degraded_cues,
            join,
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// End of the last segment, measured from the start of the track.
    pub fn duration(&self) -> Duration {
        self.segments.last().map_or(Duration::ZERO, |s| s.end)
    }

    /// Segment texts joined with the configured `JoinStyle`.
    pub fn text(&self) -> String {
        self.text_with(self.join)
    }

    pub fn text_with(&self, join: JoinStyle) -> String {
        self.segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(join.separator())
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// `Key: value` pairs from the WebVTT header block.
    pub fn metadata(&self) -> &[(String, String)] {
        &self.metadata
    }

    pub fn language(&self) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case("language"))
            .map(|(_, value)| value.as_str())
    }

    /// Number of cues whose inline word timing was inconsistent and replaced
    /// by interpolation.
    pub fn degraded_cues(&self) -> usize {
        self.degraded_cues
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.text())
    }
}
