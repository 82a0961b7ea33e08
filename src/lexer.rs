use crate::error::{CleanError, Result};

use std::iter::{Enumerate, Peekable};
use std::str::Lines;

const HEADER: &str = "WEBVTT";
const TIMING_ARROW: &str = "-->";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    /// 1-based line number in the raw input.
    pub line: usize,
    pub kind: TokenKind<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind<'a> {
    /// The `WEBVTT` marker, with whatever free text follows it on the same line.
    Header { description: &'a str },
    /// A `Key: value` line of the header block.
    Metadata { key: &'a str, value: &'a str },
    /// A cue identifier preceding a timing line.
    CueId(&'a str),
    /// Raw, not yet validated, timing fields.
    CueTiming {
        start: &'a str,
        end: &'a str,
        settings: &'a str,
    },
    TextLine(&'a str),
    Blank,
    Comment(&'a str),
    /// Lines of STYLE and REGION blocks.
    Ignored(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    BeforeHeader,
    Header,
    Between,
    Comment,
    Ignored,
    Cue,
}

/// Lazy, single pass tokenizer over a WebVTT document.
///
/// Yields one token per input line. The first non-blank line must be the
/// `WEBVTT` header; if it isn't, a single `CleanError::Format` is yielded and
/// the iterator ends.
pub struct Tokenizer<'a> {
    lines: Peekable<Enumerate<Lines<'a>>>,
    block: Block,
    done: bool,
}

pub fn tokenize(input: &str) -> Tokenizer<'_> {
    let input = input.strip_prefix('\u{FEFF}').unwrap_or(input);
    Tokenizer {
        lines: input.lines().enumerate().peekable(),
        block: Block::BeforeHeader,
        done: false,
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let (idx, line) = self.lines.next()?;
        let line_no = idx + 1;

        let kind = if line.is_empty() {
            if self.block != Block::BeforeHeader {
                self.block = Block::Between;
            }
            TokenKind::Blank
        } else {
            match self.block {
                Block::BeforeHeader => match header_description(line) {
                    Some(description) => {
                        self.block = Block::Header;
                        TokenKind::Header { description }
                    }
                    None if line.trim().is_empty() => TokenKind::Blank,
                    None => {
                        self.done = true;
                        return Some(Err(CleanError::format(
                            line_no,
                            format!("expected '{}' but found '{}'", HEADER, line.trim()),
                        )));
                    }
                },
                Block::Header if line.contains(TIMING_ARROW) => {
                    self.done = true;
                    return Some(Err(CleanError::structure(
                        line_no,
                        "expected a blank line between the header and the first cue",
                    )));
                }
                Block::Header => match line.split_once(':') {
                    Some((key, value)) => TokenKind::Metadata {
                        key: key.trim(),
                        value: value.trim(),
                    },
                    None => TokenKind::Metadata {
                        key: line.trim(),
                        value: "",
                    },
                },
                Block::Comment => TokenKind::Comment(line),
                Block::Ignored => TokenKind::Ignored(line),
                Block::Cue => {
                    if line.contains(TIMING_ARROW) {
                        timing(line)
                    } else {
                        TokenKind::TextLine(line)
                    }
                }
                Block::Between => self.block_start(line),
            }
        };

        Some(Ok(Token {
            line: line_no,
            kind,
        }))
    }
}

impl<'a> Tokenizer<'a> {
    fn block_start(&mut self, line: &'a str) -> TokenKind<'a> {
        if let Some(rest) = keyword(line, "NOTE") {
            self.block = Block::Comment;
            return TokenKind::Comment(rest);
        }
        if keyword(line, "STYLE").is_some() || keyword(line, "REGION").is_some() {
            self.block = Block::Ignored;
            return TokenKind::Ignored(line);
        }
        if line.contains(TIMING_ARROW) {
            self.block = Block::Cue;
            return timing(line);
        }
        let next_is_timing = self
            .lines
            .peek()
            .map_or(false, |(_, next)| next.contains(TIMING_ARROW));
        if next_is_timing {
            TokenKind::CueId(line.trim())
        } else {
            // Payload outside of any cue; the parser decides what to do with it.
            TokenKind::TextLine(line)
        }
    }
}

fn header_description(line: &str) -> Option<&str> {
    keyword(line.trim_end(), HEADER)
}

/// Matches `word` alone on the line or followed by a space or tab, returning
/// the remaining text.
fn keyword<'a>(line: &'a str, word: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(word)?;
    if rest.is_empty() {
        Some(rest)
    } else if rest.starts_with(' ') || rest.starts_with('\t') {
        Some(rest.trim())
    } else {
        None
    }
}

fn timing(line: &str) -> TokenKind<'_> {
    let (start, rest) = line.split_once(TIMING_ARROW).unwrap_or((line, ""));
    let rest = rest.trim_start();
    let (end, settings) = match rest.find(char::is_whitespace) {
        Some(idx) => (&rest[..idx], rest[idx..].trim()),
        None => (rest, ""),
    };
    TokenKind::CueTiming {
        start: start.trim(),
        end,
        settings,
    }
}
