use crate::error::{CleanError, Result};
use crate::lexer::{Token, TokenKind};

use std::time::Duration;

use nom::bytes::complete::{tag, take_while_m_n};
use nom::combinator::{all_consuming, map_res, opt, verify};
use nom::error::{ErrorKind, VerboseError};
use nom::sequence::{preceded, terminated};
use nom::{error_position, Err as NomErr, IResult};

/// A timed caption unit with its payload still in raw (marked up) form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    /// Line of the timing line this cue was read from.
    pub line: usize,
    pub start: Duration,
    pub end: Duration,
    /// Payload lines joined by a single space.
    pub text: String,
}

/// Cues plus the `Key: value` pairs from the header block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Track {
    pub metadata: Vec<(String, String)>,
    pub cues: Vec<Cue>,
}

pub fn parse_cues<'a, I>(tokens: I) -> Result<Vec<Cue>>
where
    I: IntoIterator<Item = Result<Token<'a>>>,
{
    parse_track(tokens).map(|track| track.cues)
}

pub fn parse_track<'a, I>(tokens: I) -> Result<Track>
where
    I: IntoIterator<Item = Result<Token<'a>>>,
{
    struct Pending<'a> {
        line: usize,
        start: Duration,
        end: Duration,
        lines: Vec<&'a str>,
    }

    fn finish(pending: Option<Pending<'_>>, cues: &mut Vec<Cue>) -> Result<()> {
        if let Some(p) = pending {
            if p.lines.is_empty() {
                return Err(CleanError::structure(
                    p.line,
                    "cue timing is not followed by any payload",
                ));
            }
            cues.push(Cue {
                line: p.line,
                start: p.start,
                end: p.end,
                text: p.lines.join(" "),
            });
        }
        Ok(())
    }

    let mut track = Track::default();
    let mut seen_header = false;
    let mut pending: Option<Pending<'a>> = None;

    for token in tokens {
        let token = token?;
        match token.kind {
            TokenKind::Header { .. } => seen_header = true,
            TokenKind::Metadata { key, value } => {
                track.metadata.push((key.to_string(), value.to_string()))
            }
            TokenKind::CueTiming { start, end, .. } => {
                finish(pending.take(), &mut track.cues)?;
                let (start, end) = cue_interval(token.line, start, end)?;
                pending = Some(Pending {
                    line: token.line,
                    start,
                    end,
                    lines: Vec::new(),
                });
            }
            TokenKind::TextLine(text) => match pending.as_mut() {
                Some(p) => p.lines.push(text),
                None => {
                    return Err(CleanError::structure(
                        token.line,
                        format!("payload '{}' has no preceding cue timing", text.trim()),
                    ))
                }
            },
            TokenKind::Blank
            | TokenKind::CueId(_)
            | TokenKind::Comment(_)
            | TokenKind::Ignored(_) => finish(pending.take(), &mut track.cues)?,
        }
    }
    finish(pending, &mut track.cues)?;

    if !seen_header {
        return Err(CleanError::format(1, "input is empty"));
    }
    Ok(track)
}

fn cue_interval(line: usize, start: &str, end: &str) -> Result<(Duration, Duration)> {
    let parse = |field: &str| {
        parse_timestamp(field).ok_or_else(|| {
            CleanError::timing(line, format!("'{}' is not a valid timestamp", field))
        })
    };
    let start_at = parse(start)?;
    let end_at = parse(end)?;
    if end_at < start_at {
        return Err(CleanError::timing(
            line,
            format!("cue ends ({}) before it starts ({})", end, start),
        ));
    }
    Ok((start_at, end_at))
}

/// Parses a complete `HH:MM:SS.mmm` or `MM:SS.mmm` timestamp.
pub fn parse_timestamp(input: &str) -> Option<Duration> {
    all_consuming(timestamp)(input).ok().map(|(_, ts)| ts)
}

fn timestamp(input: &str) -> IResult<&str, Duration, VerboseError<&str>> {
    // Hours are optional, so the first field is either hours or minutes
    // depending on whether a third field follows.
    let (input, first) = terminated(number(2, 9), tag(":"))(input)?;
    let (input, second) = sexagesimal(input)?;
    let (input, third) = opt(preceded(tag(":"), sexagesimal))(input)?;
    let (input, millis) = preceded(tag("."), number(3, 3))(input)?;

    let (hours, minutes, seconds) = match third {
        Some(seconds) => (first, second, seconds),
        None if first < 60 => (0, first, second),
        None => return Err(NomErr::Error(error_position!(input, ErrorKind::Verify))),
    };

    Ok((
        input,
        Duration::from_millis(
            millis + seconds * 1000 + minutes * 60 * 1000 + hours * 60 * 60 * 1000,
        ),
    ))
}

fn sexagesimal(input: &str) -> IResult<&str, u64, VerboseError<&str>> {
    verify(number(2, 2), |n: &u64| *n < 60)(input)
}

fn number<'a>(
    min: usize,
    max: usize,
) -> impl FnMut(&'a str) -> IResult<&'a str, u64, VerboseError<&'a str>> {
    map_res(
        take_while_m_n(min, max, |c: char| c.is_ascii_digit()),
        |s: &str| s.parse::<u64>(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    macro_rules! test_parse_ts {
        ($($name:ident: $value:expr,)*) => {
        $(
            #[test]
            fn $name() {
                let (input, expected): (&str, Option<u64>) = $value;

                let parsed = parse_timestamp(input).map(|d| d.as_millis() as u64);

                assert_eq!(parsed, expected);
            }
        )*
        }
    }

    test_parse_ts! {
        test_parse_ts_0: ("00:00:01.200", Some(1200)),
        test_parse_ts_1: ("00:00:00.000", Some(0)),
        test_parse_ts_2: ("01:01:01.200", Some(3_661_200)),
        test_parse_ts_3: ("01:02.003", Some(62_003)),
        test_parse_ts_4: ("100:00:00.001", Some(360_000_001)),
        test_parse_ts_5: ("00:00:01,200", None),
        test_parse_ts_6: ("00:00:01.2", None),
        test_parse_ts_7: ("00:60:00.000", None),
        test_parse_ts_8: ("00:00:60.000", None),
        test_parse_ts_9: ("60:00.000", None),
        test_parse_ts_10: ("aa:00:00.000", None),
        test_parse_ts_11: ("0:00:00.000", None),
        test_parse_ts_12: ("00:00:00.0000", None),
        test_parse_ts_13: ("", None),
    }

    fn parse(input: &str) -> Result<Vec<Cue>> {
        parse_cues(tokenize(input))
    }

    #[test]
    fn joins_payload_lines_with_a_space() {
        let cues = parse(
            "WEBVTT\n\n00:00:00.000 --> 00:00:01.500 align:start\nfirst line\nsecond line\n\n\
             00:00:01.500 --> 00:00:03.000\nthird\n",
        )
        .unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].text, "first line second line");
        assert_eq!(cues[0].start, Duration::ZERO);
        assert_eq!(cues[0].end, Duration::from_millis(1500));
        assert_eq!(cues[0].line, 3);
        assert_eq!(cues[1].text, "third");
        assert_eq!(cues[1].line, 7);
    }

    #[test]
    fn whitespace_only_payload_is_still_a_payload() {
        let cues = parse("WEBVTT\n\n00:00:00.000 --> 00:00:00.010\n \n").unwrap();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, " ");
    }

    #[test]
    fn header_metadata_is_collected() {
        let track = parse_track(tokenize(
            "WEBVTT\nKind: captions\nLanguage: en\n\n00:00.000 --> 00:01.000\nhi\n",
        ))
        .unwrap();
        assert_eq!(
            track.metadata,
            vec![
                ("Kind".to_string(), "captions".to_string()),
                ("Language".to_string(), "en".to_string()),
            ]
        );
        assert_eq!(track.cues.len(), 1);
    }

    #[test]
    fn end_before_start_is_rejected() {
        let err = parse("WEBVTT\n\n00:00:01.000 --> 00:00:00.500\nHi\n").unwrap_err();
        assert!(matches!(err, CleanError::Timing { line: 3, .. }));
    }

    #[test]
    fn non_numeric_timestamp_is_rejected() {
        let err = parse("WEBVTT\n\n00:00:0x.000 --> 00:00:01.000\nHi\n").unwrap_err();
        assert!(matches!(err, CleanError::Timing { line: 3, .. }));
    }

    #[test]
    fn timing_without_payload_is_a_structure_error() {
        let err = parse("WEBVTT\n\n00:00:00.000 --> 00:00:01.000\n\n00:00:01.000 --> 00:00:02.000\nHi\n")
            .unwrap_err();
        assert!(matches!(err, CleanError::Structure { line: 3, .. }));

        let err = parse("WEBVTT\n\n00:00:00.000 --> 00:00:01.000\n").unwrap_err();
        assert!(matches!(err, CleanError::Structure { line: 3, .. }));
    }

    #[test]
    fn back_to_back_timing_lines_are_a_structure_error() {
        let err = parse("WEBVTT\n\n00:00:00.000 --> 00:00:01.000\n00:00:01.000 --> 00:00:02.000\nHi\n")
            .unwrap_err();
        assert!(matches!(err, CleanError::Structure { line: 3, .. }));
    }

    #[test]
    fn stray_payload_is_a_structure_error() {
        let err = parse("WEBVTT\n\nno timing here\n").unwrap_err();
        assert!(matches!(err, CleanError::Structure { line: 3, .. }));
    }

    #[test]
    fn cue_identifiers_and_notes_are_skipped() {
        let cues = parse(
            "WEBVTT\n\nNOTE generated\n\n1\n00:00:00.000 --> 00:00:01.000\nHi\n\n\
             2\n00:00:01.000 --> 00:00:02.000\nthere\n",
        )
        .unwrap();
        let texts: Vec<_> = cues.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["Hi", "there"]);
    }

    #[test]
    fn empty_input_has_no_header() {
        assert!(matches!(parse(""), Err(CleanError::Format { line: 1, .. })));
    }

    #[test]
    fn header_only_track_has_no_cues() {
        assert_eq!(parse("WEBVTT\n").unwrap(), Vec::new());
    }
}
