//! CLI tool for rendering sheet notation to a WAV file
//!
//! Usage: render <input.sheet> [-o output.wav]
//!
//! If output is not specified, generates <input>.wav

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use tonesheet::generator::{Envelope, FourPhase};
use tonesheet::notation::{Parser as SheetParser, SheetConfig};
use tonesheet::pipeline::{arrange, ArrangeConfig, Instrument};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EnvelopeArg {
    Constant,
    Sqrt,
    Exp,
    Adsr,
}

/// Render sheet notation to a mono 16-bit WAV file
#[derive(Debug, Parser)]
#[command(name = "render")]
struct Args {
    /// Path to the sheet file
    input: PathBuf,

    /// Output WAV path (defaults to <input>.wav)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Sample rate in Hz
    #[arg(long, default_value_t = 44100)]
    sample_rate: u32,

    /// Length of one tick in milliseconds
    #[arg(long, default_value_t = 1.0)]
    tick_ms: f64,

    /// Instrument for every note (harmonic or organ)
    #[arg(long, default_value = "harmonic")]
    instrument: Instrument,

    #[arg(long, value_enum, default_value_t = EnvelopeArg::Adsr)]
    envelope: EnvelopeArg,

    /// Gain applied after peak normalization
    #[arg(long, default_value_t = 0.9)]
    gain: f32,

    /// Silence appended after the last note, in seconds
    #[arg(long, default_value_t = 0.0)]
    tail: f64,
}

fn default_output(input: &Path) -> PathBuf {
    input.with_extension("wav")
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.tick_ms <= 0.0 {
        bail!("--tick-ms must be positive");
    }
    if !(0.0..=1.0).contains(&args.gain) {
        bail!("--gain must be between 0.0 and 1.0");
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.input));

    let content = fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;

    let sheet = SheetParser::new(&content, SheetConfig::default())
        .parse()
        .with_context(|| format!("parsing {}", args.input.display()))?;
    println!(
        "Parsed {} notes over {} ticks (tempo {})",
        sheet.schedule.len(),
        sheet.end_tick,
        sheet.config.tempo
    );

    let config = ArrangeConfig {
        sample_rate: args.sample_rate,
        seconds_per_tick: args.tick_ms / 1000.0,
        instrument: args.instrument,
        envelope: match args.envelope {
            EnvelopeArg::Constant => Envelope::Constant,
            EnvelopeArg::Sqrt => Envelope::SqrtFade,
            EnvelopeArg::Exp => Envelope::ExpFade,
            EnvelopeArg::Adsr => {
                Envelope::FourPhase(FourPhase::new(1.0, 0.8, 0.3, 0.01, 0.05, 0.02))
            }
        },
        tail: args.tail,
        ..Default::default()
    };

    println!("Configuration:");
    println!("  Sample rate: {} Hz", config.sample_rate);
    println!("  Tick: {} ms", args.tick_ms);
    println!("  Instrument: {:?}", config.instrument);
    println!("  Envelope: {:?}", args.envelope);
    println!();

    let controller = arrange(&sheet, &config);
    println!("Rendering {:.3}s...", controller.duration());

    let mut buffer = controller.render().context("rendering sheet")?;
    let peak = buffer.peak();
    buffer.normalize();
    buffer.adjust(args.gain);

    buffer
        .write_wav(&output)
        .with_context(|| format!("writing {}", output.display()))?;

    println!(
        "✓ Generated {} ({} samples, peak before normalization {:.3})",
        output.display(),
        buffer.len(),
        peak
    );
    Ok(())
}
