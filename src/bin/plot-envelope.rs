use plotters::prelude::*;
use tonesheet::generator::{Envelope, FourPhase, Harmonic};

const SAMPLE_RATE: f64 = 1000.0; // 1ms = 1 sample
const DISCONTINUITY_THRESHOLD: f64 = 0.15;
/// Only used by the exponential fade
const FREQUENCY: f64 = 440.0;

struct Args {
    envelope: Envelope,
    sustain_secs: f64,
    output_path: String,
}

fn print_usage() {
    eprintln!("Usage: plot-envelope constant|sqrt|exp <duration_s> <output.svg>");
    eprintln!("       plot-envelope adsr <sustain_s> <output.svg>");
    eprintln!("                     <level_a> <level_d> <level_r> <time_a> <time_d> <time_r>");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  plot-envelope sqrt 1.0 pluck.svg");
    eprintln!("  plot-envelope adsr 3.0 adsr.svg 1 0.8 0.3 0.3 0.25 0.02");
}

fn parse_args() -> Result<Args, Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 4 {
        print_usage();
        return Err("Invalid number of arguments".into());
    }

    let sustain_secs: f64 = args[2].parse()?;
    if sustain_secs < 0.0 {
        return Err("Duration must be non-negative".into());
    }

    let envelope = match args[1].as_str() {
        "constant" => Envelope::Constant,
        "sqrt" => Envelope::SqrtFade,
        "exp" => Envelope::ExpFade,
        "adsr" => {
            if args.len() != 10 {
                print_usage();
                return Err("adsr takes six shape parameters".into());
            }
            let p = args[4..10]
                .iter()
                .map(|s| s.parse::<f64>())
                .collect::<Result<Vec<_>, _>>()?;
            if p[3] < 0.0 || p[4] < 0.0 || p[5] < 0.0 {
                return Err("Time values must be non-negative".into());
            }
            Envelope::FourPhase(FourPhase::new(p[0], p[1], p[2], p[3], p[4], p[5]))
        }
        other => {
            print_usage();
            return Err(format!("Unknown envelope '{}'", other).into());
        }
    };

    Ok(Args {
        envelope,
        sustain_secs,
        output_path: args[3].clone(),
    })
}

/// Sample the envelope once per millisecond over the element's full span
fn sample_envelope(args: &Args) -> Result<Vec<(f64, f64)>, Box<dyn std::error::Error>> {
    let owner = Harmonic::new(FREQUENCY, 1.0, args.sustain_secs, args.envelope);
    let span = owner.duration();
    let count = (span * SAMPLE_RATE).floor() as usize;

    let mut points = Vec::with_capacity(count + 1);
    for n in 0..=count {
        let t = (n as f64 / SAMPLE_RATE).min(span);
        points.push((t * 1000.0, args.envelope.gain(&owner, t)?));
    }
    Ok(points)
}

fn report_discontinuities(points: &[(f64, f64)]) {
    let mut max_diff = 0.0f64;
    let mut max_diff_ms = 0.0f64;

    for pair in points.windows(2) {
        let diff = (pair[1].1 - pair[0].1).abs();
        if diff > max_diff {
            max_diff = diff;
            max_diff_ms = pair[1].0;
        }
    }

    if max_diff > DISCONTINUITY_THRESHOLD {
        println!(
            "  ! Jump of {:.3} at {}ms (above threshold {})",
            max_diff, max_diff_ms, DISCONTINUITY_THRESHOLD
        );
    } else {
        println!(
            "  ✓ Max step: {:.6} at {}ms (below threshold {})",
            max_diff, max_diff_ms, DISCONTINUITY_THRESHOLD
        );
    }
}

fn create_plot(args: &Args, points: &[(f64, f64)]) -> Result<(), Box<dyn std::error::Error>> {
    let root = SVGBackend::new(&args.output_path, (800, 400)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_time = points.last().map_or(1.0, |p| p.0.max(1.0));
    let max_level = points.iter().fold(1.0f64, |m, p| m.max(p.1)) * 1.1;

    let title = format!("{:?}, duration={}s", args.envelope, args.sustain_secs);

    let mut chart = ChartBuilder::on(&root)
        .caption(&title, ("sans-serif", 16))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..max_time, 0f64..max_level)?;

    chart
        .configure_mesh()
        .x_desc("Time (ms)")
        .y_desc("Gain")
        .x_labels(10)
        .y_labels(10)
        .draw()?;

    chart.draw_series(LineSeries::new(
        points.iter().copied(),
        BLUE.stroke_width(2),
    ))?;

    root.present()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = parse_args()?;

    println!("Envelope Plot Generator");
    println!("=======================");
    println!("  Envelope: {:?}", args.envelope);
    println!("  Duration: {}s", args.sustain_secs);
    println!();

    print!("  Sampling envelope... ");
    let points = sample_envelope(&args)?;
    println!("done ({} points)", points.len());

    report_discontinuities(&points);

    print!("  Creating plot... ");
    create_plot(&args, &points)?;
    println!("done");

    println!();
    println!("Output: {}", args.output_path);

    Ok(())
}
