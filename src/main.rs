use vttclean::serialiser::{self, OutputFormat};
use vttclean::{CleanOpts, JoinStyle, SegmentBoundary};

use std::io::{self, Read};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser as ClapParser, ValueEnum};
use log::{info, warn};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run() {
        Ok(()) => (),
        Err(err) => {
            eprintln!("An error occurred: {}", err);
            for cause in err.chain().skip(1) {
                eprintln!("    {}", cause);
            }
            std::process::exit(1);
        }
    }
}

#[derive(ClapParser)]
#[command(about = "Turn automatically generated WebVTT captions into a clean transcript")]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "The file to read from. If not supplied, the captions will be read from standard input.",
        default_value = "-"
    )]
    input: String,
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "The file to write to. If not supplied, the transcript will be written to standard output.",
        default_value = "-"
    )]
    output: String,
    #[arg(short, long, value_enum, default_value_t = Format::Text, help = "Output format.")]
    format: Format,
    #[arg(
        long,
        value_enum,
        default_value_t = Join::Space,
        help = "How segments are separated in text output."
    )]
    join: Join,
    #[arg(
        long,
        value_name = "SECS",
        help = "Start a new segment once the current one has run for this many seconds."
    )]
    max_segment: Option<f64>,
    #[arg(
        long,
        value_enum,
        default_value_t = Boundary::Window,
        help = "Where segments break: when the caption window scrolls, or at every cue."
    )]
    boundary: Boundary,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Vtt,
    Srt,
}

#[derive(Clone, Copy, ValueEnum)]
enum Join {
    Space,
    Newline,
}

#[derive(Clone, Copy, ValueEnum)]
enum Boundary {
    Window,
    Cue,
}

impl Cli {
    fn opts(&self) -> Result<CleanOpts> {
        let mut opts = CleanOpts::new()
            .join(match self.join {
                Join::Space => JoinStyle::Space,
                Join::Newline => JoinStyle::Newline,
            })
            .boundary(match self.boundary {
                Boundary::Window => SegmentBoundary::Window,
                Boundary::Cue => SegmentBoundary::Cue,
            });
        if let Some(secs) = self.max_segment {
            if !secs.is_finite() || secs <= 0.0 {
                bail!("--max-segment must be a positive number of seconds, got {}", secs);
            }
            opts = opts.max_segment_duration(Duration::from_secs_f64(secs));
        }
        Ok(opts)
    }

    fn output_format(&self) -> OutputFormat {
        match self.format {
            Format::Text => OutputFormat::Text,
            Format::Vtt => OutputFormat::Vtt,
            Format::Srt => OutputFormat::Srt,
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let opts = cli.opts()?;

    let data = if cli.input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(&cli.input)
            .context(format!("Failed to open input file: '{}'", cli.input))?
    };

    let transcript = vttclean::clean(&data, &opts)
        .context(format!("Failed to parse WebVTT file: '{}'", cli.input))?;
    if transcript.degraded_cues() > 0 {
        warn!(
            "{} cue(s) had inconsistent word timings; their words were spaced evenly instead",
            transcript.degraded_cues()
        );
    }
    info!(
        "Reconstructed {} segment(s), {} word(s)",
        transcript.len(),
        transcript.words().len()
    );

    if cli.output == "-" {
        serialiser::serialise(&transcript, cli.output_format(), io::stdout())?;
    } else {
        let dst = std::fs::File::create(&cli.output)
            .context(format!("Failed to create output file: '{}'", cli.output))?;
        serialiser::serialise(&transcript, cli.output_format(), dst)?;
    };

    Ok(())
}
