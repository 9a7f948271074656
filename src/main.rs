use anyhow::{Context, Result};
use tonesheet::generator::{Envelope, FourPhase, Harmonic};
use tonesheet::pipeline::AudioController;

const OUTPUT_PATH: &str = "out.wav";
const SAMPLE_RATE: u32 = 44100;
const LENGTH_SECS: f64 = 5.0;
const OUTPUT_GAIN: f32 = 0.9;

fn compose() -> AudioController {
    let mut ac = AudioController::new(LENGTH_SECS, SAMPLE_RATE);

    let envelope = Envelope::FourPhase(FourPhase::new(1.0, 0.8, 0.3, 0.3, 0.25, 0.02));
    let a4 = 440.0;
    let f_sharp4 = a4 * 2f64.powf(-3.0 / 12.0);

    ac.add_element(0.0, Harmonic::new(a4, 1.0, 3.0, envelope));
    ac.add_element(1.3, Harmonic::new(f_sharp4, 0.5, 4.0, envelope));
    ac
}

fn main() -> Result<()> {
    println!("Starting...");

    let ac = compose();
    println!(
        "  {} placements, {}s at {} Hz",
        ac.placements().len(),
        ac.duration(),
        ac.sample_rate()
    );

    let mut buffer = ac.render().context("rendering composition")?;
    buffer.normalize();
    buffer.adjust(OUTPUT_GAIN);

    println!("Saving to '{}'...", OUTPUT_PATH);
    buffer
        .write_wav(OUTPUT_PATH)
        .with_context(|| format!("writing {}", OUTPUT_PATH))?;

    println!("Done.");
    Ok(())
}
