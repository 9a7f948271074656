//! Arranger
//!
//! Turns a parsed sheet into sound elements on a render timeline: ticks
//! become seconds and each note becomes an instrument voice.

use crate::generator::{Composite, Envelope, Harmonic, Sound, SoundElement};
use crate::notation::{Note, Sheet};
use crate::pipeline::controller::AudioController;
use std::fmt;
use std::str::FromStr;

/// Element used for every note of a sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instrument {
    /// Single sine partial
    Harmonic,
    /// Sine plus fifth overtone
    Organ,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownInstrument(pub String);

impl fmt::Display for UnknownInstrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown instrument '{}' (expected harmonic or organ)", self.0)
    }
}

impl std::error::Error for UnknownInstrument {}

impl FromStr for Instrument {
    type Err = UnknownInstrument;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "harmonic" | "sine" => Ok(Instrument::Harmonic),
            "organ" => Ok(Instrument::Organ),
            _ => Err(UnknownInstrument(s.to_string())),
        }
    }
}

/// Configuration for turning a sheet into placements
#[derive(Debug, Clone, PartialEq)]
pub struct ArrangeConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Length of one tick in seconds
    pub seconds_per_tick: f64,
    /// Peak amplitude of each note
    pub amplitude: f64,
    pub instrument: Instrument,
    pub envelope: Envelope,
    /// Extra silence after the last element ends, in seconds
    pub tail: f64,
}

impl Default for ArrangeConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            seconds_per_tick: 0.001, // 1 tick = 1ms
            amplitude: 1.0,
            instrument: Instrument::Harmonic,
            envelope: Envelope::Constant,
            tail: 0.0,
        }
    }
}

impl ArrangeConfig {
    /// Build the element for one pitched note
    ///
    /// Returns `None` for a pause.
    pub fn voice(&self, note: &Note) -> Option<SoundElement> {
        let frequency = note.frequency()?;
        let duration = note.duration as f64 * self.seconds_per_tick;
        let element = match self.instrument {
            Instrument::Harmonic => {
                Harmonic::new(frequency, self.amplitude, duration, self.envelope).into()
            }
            Instrument::Organ => {
                Composite::organ(frequency, self.amplitude, duration, self.envelope).into()
            }
        };
        Some(element)
    }
}

/// Place every scheduled note of `sheet` on a new controller
///
/// The render lasts until the last element ends, plus `config.tail`.
/// The sheet's tempo is not consulted; `seconds_per_tick` alone sets timing.
pub fn arrange(sheet: &Sheet, config: &ArrangeConfig) -> AudioController {
    let placed: Vec<(f64, SoundElement)> = sheet
        .schedule
        .iter()
        .filter_map(|entry| {
            let offset = entry.tick as f64 * config.seconds_per_tick;
            config.voice(&entry.note).map(|element| (offset, element))
        })
        .collect();

    let end = placed
        .iter()
        .map(|(offset, element)| offset + element.duration())
        .fold(0.0, f64::max);

    let mut controller = AudioController::new(end + config.tail.max(0.0), config.sample_rate);
    for (offset, element) in placed {
        controller.add_element(offset, element);
    }
    controller
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::FourPhase;
    use crate::notation::parse_sheet;

    fn config() -> ArrangeConfig {
        ArrangeConfig {
            sample_rate: 1000,
            seconds_per_tick: 0.01,
            ..Default::default()
        }
    }

    #[test]
    fn test_instrument_from_str() {
        assert_eq!("organ".parse::<Instrument>(), Ok(Instrument::Organ));
        assert_eq!("Harmonic".parse::<Instrument>(), Ok(Instrument::Harmonic));
        assert!("kazoo".parse::<Instrument>().is_err());
    }

    #[test]
    fn test_ticks_become_offsets() {
        let sheet = parse_sheet("A4.10 P.10 A5.20").unwrap();
        let ac = arrange(&sheet, &config());

        let offsets: Vec<f64> = ac.placements().iter().map(|p| p.offset).collect();
        assert_eq!(offsets.len(), 2);
        assert!((offsets[0] - 0.0).abs() < 1e-12);
        assert!((offsets[1] - 0.2).abs() < 1e-12);
        assert!((ac.duration() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_voice_frequency_and_duration() {
        let sheet = parse_sheet("A4.50").unwrap();
        let element = config().voice(&sheet.schedule[0].note).unwrap();
        match element {
            SoundElement::Harmonic(h) => {
                assert_eq!(h.frequency(), 440.0);
                assert!((h.nominal_duration() - 0.5).abs() < 1e-12);
            }
            other => panic!("unexpected element: {:?}", other),
        }
    }

    #[test]
    fn test_organ_instrument() {
        let cfg = ArrangeConfig {
            instrument: Instrument::Organ,
            ..config()
        };
        let sheet = parse_sheet("C4.10").unwrap();
        let ac = arrange(&sheet, &cfg);
        assert!(matches!(
            ac.placements()[0].element,
            SoundElement::Composite(_)
        ));
    }

    #[test]
    fn test_envelope_override_extends_render() {
        let cfg = ArrangeConfig {
            envelope: Envelope::FourPhase(FourPhase::new(1.0, 0.8, 0.3, 0.1, 0.1, 0.1)),
            tail: 0.5,
            ..config()
        };
        let sheet = parse_sheet("C4.100").unwrap();
        let ac = arrange(&sheet, &cfg);
        assert!((ac.duration() - (1.3 + 0.5)).abs() < 1e-9);
    }

    #[test]
    fn test_chord_shares_offset() {
        let sheet = parse_sheet("C4.10-E4.10-G4.10").unwrap();
        let ac = arrange(&sheet, &config());
        assert_eq!(ac.placements().len(), 3);
        assert!(ac.placements().iter().all(|p| p.offset == 0.0));
    }

    #[test]
    fn test_empty_sheet_renders_nothing() {
        let sheet = parse_sheet("# only a comment\n  \n").unwrap();
        let cfg = ArrangeConfig {
            tail: 0.25,
            ..config()
        };
        let buffer = arrange(&sheet, &cfg).render().unwrap();
        assert_eq!(buffer.len(), 250);
        assert!(buffer.samples().iter().all(|&s| s == 0.0));
    }
}
