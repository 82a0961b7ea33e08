use crate::payload::NormalizedCue;
use crate::transcript::{JoinStyle, Segment, Word};

use std::time::Duration;

use log::debug;

/// Where the engine starts a new segment.
///
/// The choice only changes how words are grouped, never which words are kept
/// or when they start. Three rolling updates `Hello`, `Hello world` and
/// `Hello world today` give one segment, `Hello world today`, under `Window`,
/// and three segments, `Hello` / `world` / `today`, under `Cue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SegmentBoundary {
    /// When the caption window scrolls or resets: one segment per caption
    /// shown on screen.
    #[default]
    Window,
    /// At every cue that contributes new words: one segment per update.
    Cue,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanOpts {
    /// Close a segment before a word that starts this long after the segment
    /// did. `None` means segments only break on window boundaries.
    pub max_segment_duration: Option<Duration>,
    pub boundary: SegmentBoundary,
    pub join: JoinStyle,
}

impl CleanOpts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_segment_duration(mut self, max: Duration) -> Self {
        self.max_segment_duration = Some(max);
        self
    }

    pub fn boundary(mut self, boundary: SegmentBoundary) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn join(mut self, join: JoinStyle) -> Self {
        self.join = join;
        self
    }
}

#[derive(Debug, Default)]
pub struct Reconstruction {
    pub segments: Vec<Segment>,
    pub words: Vec<Word>,
    /// Cues whose inline timestamps were discarded.
    pub degraded_cues: usize,
}

/// Collapses rolling caption updates into non-overlapping segments.
pub fn process(cues: Vec<NormalizedCue>, opts: &CleanOpts) -> Reconstruction {
    let cues = prepare(cues);
    let mut engine = Engine::new(opts);
    for cue in cues {
        engine.push(cue);
    }
    engine.finish()
}

fn prepare(mut cues: Vec<NormalizedCue>) -> Vec<NormalizedCue> {
    if !cues.windows(2).all(|pair| pair[0].start <= pair[1].start) {
        debug!("Cues are not in start order, re-sorting");
        // Stable, so cues starting together keep their file order.
        cues.sort_by_key(|cue| cue.start);
    }

    cues.retain(|cue| !cue.is_empty());
    let before = cues.len();
    cues.dedup_by(|next, prev| {
        next.start == prev.start && next.end == prev.end && next.spans == prev.spans
    });
    if cues.len() < before {
        debug!("Collapsed {} duplicate cue(s)", before - cues.len());
    }
    cues
}

struct Engine<'o> {
    opts: &'o CleanOpts,
    /// Words of the last cue that added anything: what is on screen.
    window: Vec<String>,
    words: Vec<Word>,
    segments: Vec<Segment>,
    /// Index into `words` where the open segment begins.
    open: Option<usize>,
    degraded_cues: usize,
}

impl<'o> Engine<'o> {
    fn new(opts: &'o CleanOpts) -> Self {
        Self {
            opts,
            window: Vec::new(),
            words: Vec::new(),
            segments: Vec::new(),
            open: None,
            degraded_cues: 0,
        }
    }

    fn push(&mut self, cue: NormalizedCue) {
        let incoming: Vec<&str> = cue.words().collect();
        let shared = overlap(&self.window, &incoming);

        if shared == 0 && contains_run(&self.window, &incoming) {
            self.extend(cue.end);
            return;
        }

        let closing = shared < self.window.len() || self.opts.boundary == SegmentBoundary::Cue;
        // A new segment must not open with the words the closing one ends on.
        let skip = if closing {
            shared + overlap(&self.open_words(), &incoming[shared..])
        } else {
            shared
        };
        if skip == incoming.len() {
            self.extend(cue.end);
            return;
        }
        if closing {
            self.close();
        }

        let window: Vec<String> = incoming.iter().map(|w| w.to_string()).collect();
        let starts = self.word_starts(&cue, skip);
        let end = cue.end;
        for (span, start) in cue.spans.into_iter().skip(skip).zip(starts) {
            self.commit(span.text, start, end);
        }
        self.window = window;
    }

    /// The cue added nothing new but keeps the last words on screen longer.
    fn extend(&mut self, end: Duration) {
        if let Some(last) = self.words.last_mut() {
            if end > last.end {
                last.end = end;
            }
        }
    }

    fn open_words(&self) -> Vec<&str> {
        match self.open {
            Some(first) => self.words[first..].iter().map(|w| w.text.as_str()).collect(),
            None => Vec::new(),
        }
    }

    fn commit(&mut self, text: String, start: Duration, cue_end: Duration) {
        let floor = self.words.last().map_or(Duration::ZERO, |w| w.start);
        let start = start.max(floor);

        if let (Some(max), Some(first)) = (self.opts.max_segment_duration, self.open) {
            if start.saturating_sub(self.words[first].start) >= max {
                self.close();
            }
        }

        if let Some(prev) = self.words.last_mut() {
            prev.end = prev.end.min(start);
        }
        if self.open.is_none() {
            // First word after a close; the closed segment may not outlast it.
            if let Some(segment) = self.segments.last_mut() {
                segment.end = segment.end.min(start);
            }
            self.open = Some(self.words.len());
        }

        self.words.push(Word {
            text,
            start,
            end: cue_end.max(start),
            segment: self.segments.len(),
        });
    }

    fn close(&mut self) {
        let Some(first) = self.open.take() else {
            return;
        };
        let words = &self.words[first..];
        if let (Some(head), Some(tail)) = (words.first(), words.last()) {
            let text = words
                .iter()
                .map(|w| w.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            self.segments.push(Segment {
                start: head.start,
                end: tail.end,
                text,
            });
        }
    }

    fn word_starts(&mut self, cue: &NormalizedCue, skip: usize) -> Vec<Duration> {
        let tagged = cue.spans.iter().any(|s| s.timing_offset.is_some());
        let use_tags = tagged && tags_consistent(cue);
        if tagged && !use_tags {
            debug!(
                "Cue at line {} has inconsistent inline timestamps, interpolating",
                cue.line
            );
            self.degraded_cues += 1;
        }

        let anchors: Vec<Option<Duration>> = cue.spans[skip..]
            .iter()
            .map(|s| if use_tags { s.timing_offset } else { None })
            .collect();
        spread(&anchors, cue.start, cue.end)
    }

    fn finish(mut self) -> Reconstruction {
        self.close();
        Reconstruction {
            segments: self.segments,
            words: self.words,
            degraded_cues: self.degraded_cues,
        }
    }
}

/// Longest run of trailing `window` words equal to the leading `incoming` words.
fn overlap<A: AsRef<str>, B: AsRef<str>>(window: &[A], incoming: &[B]) -> usize {
    let max = window.len().min(incoming.len());
    (1..=max)
        .rev()
        .find(|&k| {
            window[window.len() - k..]
                .iter()
                .zip(&incoming[..k])
                .all(|(a, b)| a.as_ref() == b.as_ref())
        })
        .unwrap_or(0)
}

/// Whether `incoming` appears verbatim inside `window`.
fn contains_run(window: &[String], incoming: &[&str]) -> bool {
    !incoming.is_empty()
        && incoming.len() <= window.len()
        && window.windows(incoming.len()).any(|run| {
            run.iter()
                .zip(incoming)
                .all(|(a, b)| a.as_str() == *b)
        })
}

/// Inline timestamps must be non-decreasing and lie within the cue.
fn tags_consistent(cue: &NormalizedCue) -> bool {
    let mut prev = cue.start;
    for offset in cue.spans.iter().filter_map(|s| s.timing_offset) {
        if offset < prev || offset > cue.end {
            return false;
        }
        prev = offset;
    }
    true
}

/// Fills in word start times. Known anchors are kept; the gaps are spaced
/// evenly between the previous anchor (or `start`) and the next one (or `end`).
fn spread(anchors: &[Option<Duration>], start: Duration, end: Duration) -> Vec<Duration> {
    let mut out = Vec::with_capacity(anchors.len());
    let mut prev = (0, anchors.first().copied().flatten().unwrap_or(start));

    for (i, anchor) in anchors.iter().enumerate() {
        if let Some(at) = *anchor {
            prev = (i, at);
            out.push(at);
            continue;
        }
        if i == 0 {
            out.push(prev.1);
            continue;
        }
        let (next_idx, next_at) = anchors[i + 1..]
            .iter()
            .enumerate()
            .find_map(|(k, a)| a.map(|at| (i + 1 + k, at)))
            .unwrap_or((anchors.len(), end));
        // Whole milliseconds, the resolution of the input format.
        let gap = next_at.saturating_sub(prev.1).as_millis();
        let step = gap * (i - prev.0) as u128 / (next_idx - prev.0) as u128;
        out.push(prev.1 + Duration::from_millis(step as u64));
    }
    out
}
