use super::envelope::{Envelope, EnvelopeDomainError};
use super::harmonic::Harmonic;
use super::{Sound, SoundElement};

/// Population rules for composite elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeKind {
    /// Fundamental plus a fifth above at a fifth of the amplitude
    Organ,
}

impl CompositeKind {
    fn populate(
        &self,
        frequency: f64,
        amplitude: f64,
        duration: f64,
        envelope: Envelope,
    ) -> Vec<SoundElement> {
        match self {
            CompositeKind::Organ => vec![
                Harmonic::new(frequency, amplitude, duration, envelope).into(),
                Harmonic::new(frequency * 1.5, amplitude * 0.2, duration, envelope).into(),
            ],
        }
    }
}

/// A mix of child elements sharing one start time
///
/// The duration is the longest child's, computed once at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    kind: CompositeKind,
    children: Vec<SoundElement>,
    duration: f64,
}

impl Composite {
    pub fn new(
        kind: CompositeKind,
        frequency: f64,
        amplitude: f64,
        duration: f64,
        envelope: Envelope,
    ) -> Self {
        let children = kind.populate(frequency, amplitude, duration, envelope);
        let duration = children
            .iter()
            .map(|child| child.duration())
            .fold(0.0, f64::max);
        Self {
            kind,
            children,
            duration,
        }
    }

    pub fn organ(frequency: f64, amplitude: f64, duration: f64, envelope: Envelope) -> Self {
        Self::new(CompositeKind::Organ, frequency, amplitude, duration, envelope)
    }

    pub fn kind(&self) -> CompositeKind {
        self.kind
    }

    pub fn children(&self) -> &[SoundElement] {
        &self.children
    }
}

impl Sound for Composite {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn value(&self, t: f64) -> Result<f64, EnvelopeDomainError> {
        let mut sum = 0.0;
        for child in &self.children {
            sum += child.value(t)?;
        }
        Ok(sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::envelope::FourPhase;

    #[test]
    fn test_organ_children() {
        let organ = Composite::organ(200.0, 1.0, 2.0, Envelope::Constant);
        assert_eq!(organ.kind(), CompositeKind::Organ);
        assert_eq!(organ.children().len(), 2);

        match &organ.children()[1] {
            SoundElement::Harmonic(h) => {
                assert_eq!(h.frequency(), 300.0);
                assert!((h.amplitude() - 0.2).abs() < 1e-12);
            }
            other => panic!("unexpected child: {:?}", other),
        }
    }

    #[test]
    fn test_value_is_sum_of_children() {
        let organ = Composite::organ(3.0, 1.0, 2.0, Envelope::Constant);
        let t = 0.123;
        let expected: f64 = organ
            .children()
            .iter()
            .map(|c| c.value(t).unwrap())
            .sum();
        assert!((organ.value(t).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_duration_follows_envelope_override() {
        let shape = FourPhase::new(1.0, 0.8, 0.3, 0.1, 0.2, 0.3);
        let organ = Composite::organ(440.0, 1.0, 1.0, Envelope::FourPhase(shape));
        assert!((organ.duration() - 1.6).abs() < 1e-12);
    }
}
