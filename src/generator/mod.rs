pub mod composite;
pub mod envelope;
pub mod harmonic;

pub use composite::{Composite, CompositeKind};
pub use envelope::{Envelope, EnvelopeDomainError, FourPhase};
pub use harmonic::Harmonic;

/// Core trait for sound-producing elements
///
/// Elements are evaluated in continuous time relative to their own start.
/// Evaluation has no side effects, so the same element can be sampled at
/// any time in any order.
pub trait Sound {
    /// How long the element sounds, in seconds
    fn duration(&self) -> f64;

    /// Waveform value at local time `t`
    ///
    /// # Note
    /// Callers must keep `t` within `[0, duration()]`; outside it an
    /// envelope may return `EnvelopeDomainError`.
    fn value(&self, t: f64) -> Result<f64, EnvelopeDomainError>;
}

/// Any element that can be placed on the render timeline
#[derive(Debug, Clone, PartialEq)]
pub enum SoundElement {
    Harmonic(Harmonic),
    Composite(Composite),
}

impl Sound for SoundElement {
    fn duration(&self) -> f64 {
        match self {
            SoundElement::Harmonic(h) => h.duration(),
            SoundElement::Composite(c) => c.duration(),
        }
    }

    fn value(&self, t: f64) -> Result<f64, EnvelopeDomainError> {
        match self {
            SoundElement::Harmonic(h) => h.value(t),
            SoundElement::Composite(c) => c.value(t),
        }
    }
}

impl From<Harmonic> for SoundElement {
    fn from(h: Harmonic) -> Self {
        SoundElement::Harmonic(h)
    }
}

impl From<Composite> for SoundElement {
    fn from(c: Composite) -> Self {
        SoundElement::Composite(c)
    }
}
