use crate::transcript::{Segment, Transcript};

use std::io::{BufWriter, Write};
use std::time::Duration;

use anyhow::{Context, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Segment texts joined by the transcript's join style.
    #[default]
    Text,
    /// One WebVTT cue per segment.
    Vtt,
    /// One numbered SubRip cue per segment.
    Srt,
}

pub fn serialise<W: Write>(transcript: &Transcript, format: OutputFormat, dst: W) -> Result<()> {
    let mut writer = BufWriter::new(dst);
    match format {
        OutputFormat::Text => writeln!(writer, "{}", transcript.text())?,
        OutputFormat::Vtt => write_vtt(&mut writer, transcript)?,
        OutputFormat::Srt => write_srt(&mut writer, transcript)?,
    }
    writer.flush().context("Failed to write to output.")?;
    Ok(())
}

fn write_vtt<W: Write>(buf: &mut W, transcript: &Transcript) -> Result<()> {
    writeln!(buf, "WEBVTT")?;
    for (key, value) in transcript.metadata() {
        writeln!(buf, "{}: {}", key, value)?;
    }
    writeln!(buf)?;
    for segment in transcript {
        write_cue(buf, segment, '.')?;
    }
    Ok(())
}

fn write_srt<W: Write>(buf: &mut W, transcript: &Transcript) -> Result<()> {
    for (idx, segment) in transcript.iter().enumerate() {
        writeln!(buf, "{}", idx + 1)?;
        write_cue(buf, segment, ',')?;
    }
    Ok(())
}

fn write_cue<W: Write>(buf: &mut W, segment: &Segment, millis_sep: char) -> Result<()> {
    write_ts(buf, segment.start, millis_sep)?;
    write!(buf, " --> ")?;
    write_ts(buf, segment.end, millis_sep)?;
    writeln!(buf)?;
    writeln!(buf, "{}", segment.text)?;
    writeln!(buf)?;
    Ok(())
}

fn write_ts<W: Write>(buf: &mut W, timestamp: Duration, millis_sep: char) -> Result<()> {
    let total_secs = timestamp.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    let millis = timestamp.as_millis() % 1000;
    write!(
        buf,
        "{:02}:{:02}:{:02}{}{:03}",
        hours, minutes, seconds, millis_sep, millis
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clean, CleanOpts};
    use std::io::Cursor;
    use std::time::Duration;

    macro_rules! test_write_ts {
        ($($name:ident: $value:expr,)*) => {
        $(
            #[test]
            fn $name() {
                let (input, expected) = $value;

                let ts = Duration::from_millis(input);
                let mut buf = Cursor::new(vec![]);

                write_ts(&mut buf, ts, '.').expect("Failed to write to buffer");

                assert_eq!(String::from_utf8(buf.into_inner()).unwrap(), expected);
            }
        )*
        }
    }

    test_write_ts! {
        test_write_ts_0: (0, "00:00:00.000"),
        test_write_ts_1: (1, "00:00:00.001"),
        test_write_ts_2: (999, "00:00:00.999"),
        test_write_ts_3: (1000, "00:00:01.000"),
        test_write_ts_4: (59_999, "00:00:59.999"),
        test_write_ts_5: (60_000, "00:01:00.000"),
        test_write_ts_6: (3_600_000, "01:00:00.000"),
        test_write_ts_7: (7_326_159, "02:02:06.159"),
        test_write_ts_8: (360_000_001, "100:00:00.001"),
    }

    const ROLLING: &str = "WEBVTT\nKind: captions\nLanguage: en\n\n\
        00:00:00.000 --> 00:00:01.000\nHello\n\n\
        00:00:00.500 --> 00:00:02.000\nHello world\n\n\
        00:00:02.000 --> 00:00:04.000\nsomething else\n";

    fn render(format: OutputFormat) -> String {
        let transcript = clean(ROLLING, &CleanOpts::default()).unwrap();
        let mut out = Vec::new();
        serialise(&transcript, format, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn writes_plain_text() {
        assert_eq!(render(OutputFormat::Text), "Hello world something else\n");
    }

    #[test]
    fn writes_vtt() {
        assert_eq!(
            render(OutputFormat::Vtt),
            "WEBVTT\nKind: captions\nLanguage: en\n\n\
             00:00:00.000 --> 00:00:02.000\nHello world\n\n\
             00:00:02.000 --> 00:00:04.000\nsomething else\n\n"
        );
    }

    #[test]
    fn writes_srt() {
        assert_eq!(
            render(OutputFormat::Srt),
            "1\n00:00:00,000 --> 00:00:02,000\nHello world\n\n\
             2\n00:00:02,000 --> 00:00:04,000\nsomething else\n\n"
        );
    }
}
