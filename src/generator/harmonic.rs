use super::envelope::{Envelope, EnvelopeDomainError};
use super::Sound;
use std::f64::consts::PI;

/// A single sine partial shaped by an envelope
///
/// value(t) = amplitude * sin(2π * frequency * t) * envelope(t)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Harmonic {
    frequency: f64,
    amplitude: f64,
    duration: f64,
    envelope: Envelope,
}

impl Harmonic {
    /// Create a harmonic
    ///
    /// # Arguments
    /// * `frequency` - Frequency in Hz
    /// * `amplitude` - Peak amplitude
    /// * `duration` - Nominal duration in seconds (the sustain span for `FourPhase`),
    ///   clamped to 0 when negative
    /// * `envelope` - Amplitude envelope
    pub fn new(frequency: f64, amplitude: f64, duration: f64, envelope: Envelope) -> Self {
        Self {
            frequency,
            amplitude,
            duration: duration.max(0.0),
            envelope,
        }
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    /// Duration requested at construction, before any envelope override
    pub fn nominal_duration(&self) -> f64 {
        self.duration
    }

    pub fn envelope(&self) -> Envelope {
        self.envelope
    }

    pub fn duration(&self) -> f64 {
        self.envelope
            .duration_override(self.duration)
            .unwrap_or(self.duration)
    }

    pub fn value(&self, t: f64) -> Result<f64, EnvelopeDomainError> {
        let gain = self.envelope.gain(self, t)?;
        Ok(self.amplitude * (2.0 * PI * self.frequency * t).sin() * gain)
    }
}

impl Sound for Harmonic {
    fn duration(&self) -> f64 {
        Harmonic::duration(self)
    }

    fn value(&self, t: f64) -> Result<f64, EnvelopeDomainError> {
        Harmonic::value(self, t)
    }
}
