use super::harmonic::Harmonic;
use std::fmt;

/// Amplitude envelope applied to a harmonic
///
/// Each variant maps the harmonic's local time to a multiplier of its peak
/// amplitude. Only `FourPhase` changes how long the harmonic sounds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Envelope {
    /// No shaping
    #[default]
    Constant,
    /// `(1 - t/d)^0.5` over the nominal duration, a plucked decay
    SqrtFade,
    /// `exp(t / (k * (t - d)))` with `k = frequency / 50`
    ExpFade,
    FourPhase(FourPhase),
}

/// Evaluation outside an envelope's time domain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeDomainError {
    pub time: f64,
    pub duration: f64,
}

impl fmt::Display for EnvelopeDomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Envelope evaluated at {}s outside its domain [0, {}s]",
            self.time, self.duration
        )
    }
}

impl std::error::Error for EnvelopeDomainError {}

impl Envelope {
    /// Duration this envelope imposes on a harmonic of the given nominal duration
    ///
    /// `None` means the harmonic keeps its nominal duration.
    pub fn duration_override(&self, nominal: f64) -> Option<f64> {
        match self {
            Envelope::FourPhase(shape) => Some(shape.total_duration(nominal)),
            _ => None,
        }
    }

    /// Multiplier for `owner` at local time `t`
    ///
    /// The fades are defined on `[0, d]` and reach their limit 0 at `t = d`;
    /// any other time is a domain error. The renderer keeps `t` within the
    /// owner's duration so this never fails during a render.
    pub fn gain(&self, owner: &Harmonic, t: f64) -> Result<f64, EnvelopeDomainError> {
        match self {
            Envelope::Constant => Ok(1.0),
            Envelope::SqrtFade => {
                let d = owner.nominal_duration();
                check_domain(t, d)?;
                if t >= d {
                    return Ok(0.0);
                }
                Ok((1.0 - t / d).sqrt())
            }
            Envelope::ExpFade => {
                let d = owner.nominal_duration();
                check_domain(t, d)?;
                if t >= d {
                    return Ok(0.0);
                }
                let k = owner.frequency() / 50.0;
                Ok((t / (k * (t - d))).exp())
            }
            Envelope::FourPhase(shape) => Ok(shape.level(t, owner.nominal_duration())),
        }
    }
}

fn check_domain(t: f64, duration: f64) -> Result<(), EnvelopeDomainError> {
    if t < 0.0 || t > duration {
        return Err(EnvelopeDomainError { time: t, duration });
    }
    Ok(())
}

/// Attack / decay / sustain / release shape wrapped around a sustain span
///
/// Phases, with `T = time_a + time_d + sustain + time_r`:
/// 1. Attack `[0, time_a)`: linear from `level_a` to `level_d`
/// 2. Decay `[time_a, time_d)`: quadratic ease from `level_d` to `level_r`
/// 3. Sustain `[time_d, T - time_r)`: held at `level_r`
/// 4. Release `[T - time_r, T)`: quadratic ease from `level_r` to 0
///
/// Note that `time_d` is the end of the decay phase measured from the
/// start, while it still counts as a span in `T`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FourPhase {
    pub level_a: f64,
    pub level_d: f64,
    pub level_r: f64,
    pub time_a: f64,
    pub time_d: f64,
    pub time_r: f64,
}

impl FourPhase {
    /// Create a shape
    ///
    /// Negative phase times are clamped to 0. Levels are taken as given.
    ///
    /// # Example
    /// ```
    /// use tonesheet::generator::envelope::FourPhase;
    ///
    /// let shape = FourPhase::new(1.0, 0.8, 0.3, 0.3, 0.25, 0.02);
    /// assert!((shape.total_duration(3.0) - 3.57).abs() < 1e-9);
    /// ```
    pub fn new(
        level_a: f64,
        level_d: f64,
        level_r: f64,
        time_a: f64,
        time_d: f64,
        time_r: f64,
    ) -> Self {
        Self {
            level_a,
            level_d,
            level_r,
            time_a: time_a.max(0.0),
            time_d: time_d.max(0.0),
            time_r: time_r.max(0.0),
        }
    }

    pub fn total_duration(&self, sustain: f64) -> f64 {
        self.time_a + self.time_d + sustain + self.time_r
    }

    /// Envelope level at `t` for a sustain span of `sustain` seconds
    pub fn level(&self, t: f64, sustain: f64) -> f64 {
        let total = self.total_duration(sustain);
        let release_start = total - self.time_r;

        if 0.0 <= t && t < self.time_a {
            (self.level_a * (self.time_a - t) + self.level_d * t) / self.time_a
        } else if self.time_a <= t && t < self.time_d {
            let x = (t - self.time_a) / (self.time_d - self.time_a) - 1.0;
            (self.level_d - self.level_r) * x * x + self.level_r
        } else if self.time_d <= t && t < release_start {
            self.level_r
        } else if release_start <= t && t < total {
            let x = (t - release_start) / self.time_r - 1.0;
            self.level_r * x * x
        } else {
            0.0
        }
    }
}
