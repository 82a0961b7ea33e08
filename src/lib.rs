//! Cleans automatically generated WebVTT captions into a deduplicated transcript.
//!
//! Automatic captioning emits a stream of rolling cues, each repeating most of
//! the previous cue and appending the words that were just recognised.
//! [`clean`] parses such a track and collapses the overlap, keeping a single
//! copy of every word with its own timing.
//!
//! ```
//! use vttclean::{clean, CleanOpts};
//!
//! let vtt = "WEBVTT\n\n\
//!     00:00:00.000 --> 00:00:01.000\nHello\n\n\
//!     00:00:00.500 --> 00:00:02.000\nHello world\n\n\
//!     00:00:01.500 --> 00:00:03.000\nHello world today\n";
//!
//! let transcript = clean(vtt, &CleanOpts::default()).unwrap();
//! assert_eq!(transcript.text(), "Hello world today");
//! assert_eq!(transcript.len(), 1);
//! ```
//!
//! The default [`SegmentBoundary::Window`] gives one segment per caption on
//! screen. [`SegmentBoundary::Cue`] splits the same track at every update,
//! into `Hello`, `world` and `today`.

pub mod error;
pub mod lexer;
pub mod parser;
pub mod payload;
pub mod processor;
pub mod serialiser;
pub mod transcript;

pub use crate::error::{CleanError, Result};
pub use crate::processor::{CleanOpts, SegmentBoundary};
pub use crate::serialiser::OutputFormat;
pub use crate::transcript::{JoinStyle, Segment, Transcript, Word};

/// Parses `input` and reconstructs the transcript.
///
/// Fails on the first header, structure or timing error; no partial
/// transcript is ever returned.
pub fn clean(input: &str, opts: &CleanOpts) -> Result<Transcript> {
    let track = parser::parse_track(lexer::tokenize(input))?;
    let cues = track.cues.into_iter().map(payload::normalize).collect();
    let reconstruction = processor::process(cues, opts);
    Ok(Transcript::new(reconstruction, track.metadata, opts.join))
}
