use std::fmt;

/// Pitch letter of a note, or the pause marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PitchClass {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
    Pause,
}

impl PitchClass {
    /// Map an uppercase letter to its pitch class
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'C' => Some(PitchClass::C),
            'D' => Some(PitchClass::D),
            'E' => Some(PitchClass::E),
            'F' => Some(PitchClass::F),
            'G' => Some(PitchClass::G),
            'A' => Some(PitchClass::A),
            'B' => Some(PitchClass::B),
            'P' => Some(PitchClass::Pause),
            _ => None,
        }
    }

    /// Semitone offset within the octave (C=0, D=2, ... B=11)
    ///
    /// Returns `None` for a pause.
    pub fn semitone(&self) -> Option<i32> {
        match self {
            PitchClass::C => Some(0),
            PitchClass::D => Some(2),
            PitchClass::E => Some(4),
            PitchClass::F => Some(5),
            PitchClass::G => Some(7),
            PitchClass::A => Some(9),
            PitchClass::B => Some(11),
            PitchClass::Pause => None,
        }
    }

    pub fn letter(&self) -> char {
        match self {
            PitchClass::C => 'C',
            PitchClass::D => 'D',
            PitchClass::E => 'E',
            PitchClass::F => 'F',
            PitchClass::G => 'G',
            PitchClass::A => 'A',
            PitchClass::B => 'B',
            PitchClass::Pause => 'P',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accidental {
    Flat,
    Sharp,
}

impl Accidental {
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            'b' => Some(Accidental::Flat),
            '#' => Some(Accidental::Sharp),
            _ => None,
        }
    }

    fn shift(&self) -> i32 {
        match self {
            Accidental::Flat => -1,
            Accidental::Sharp => 1,
        }
    }

    fn symbol(&self) -> char {
        match self {
            Accidental::Flat => 'b',
            Accidental::Sharp => '#',
        }
    }
}

/// A single note (or pause) read from a sheet
///
/// `octave` is 0 for pauses and strictly positive otherwise; `duration`
/// is measured in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Note {
    pub pitch: PitchClass,
    pub accidental: Option<Accidental>,
    pub octave: u32,
    pub duration: u64,
}

impl Note {
    pub fn new(
        pitch: PitchClass,
        accidental: Option<Accidental>,
        octave: u32,
        duration: u64,
    ) -> Self {
        Self {
            pitch,
            accidental,
            octave,
            duration,
        }
    }

    pub fn pause(duration: u64) -> Self {
        Self::new(PitchClass::Pause, None, 0, duration)
    }

    pub fn is_pause(&self) -> bool {
        self.pitch == PitchClass::Pause
    }

    /// Semitone offset within the octave, including the accidental
    pub fn subtone(&self) -> Option<i32> {
        let base = self.pitch.semitone()?;
        Some(base + self.accidental.map_or(0, |a| a.shift()))
    }

    /// Equal-tempered frequency in Hz with A4 = 440 Hz
    ///
    /// Formula: f = 440 * 2^((octave - 4) + (subtone - 9) / 12)
    pub fn frequency(&self) -> Option<f64> {
        let subtone = self.subtone()?;
        let exponent = (self.octave as f64 - 4.0) + (subtone as f64 - 9.0) / 12.0;
        Some(440.0 * 2f64.powf(exponent))
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pitch.letter())?;
        if let Some(accidental) = self.accidental {
            write!(f, "{}", accidental.symbol())?;
        }
        if !self.is_pause() {
            write!(f, "{}", self.octave)?;
        }
        write!(f, ".{}", self.duration)
    }
}
