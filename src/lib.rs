//! Note-sheet notation to PCM audio.
//!
//! - `notation`: lexer and recursive-descent parser producing a tick schedule
//! - `generator`: envelopes and additive sound elements
//! - `pipeline`: arranging a schedule into placements and rendering them
//! - `wav`: sample buffer post-processing and the 16-bit WAV codec

pub mod generator;
pub mod notation;
pub mod pipeline;
pub mod wav;

pub use generator::{Envelope, SoundElement};
pub use notation::{parse_sheet, Note, Sheet};
pub use pipeline::{arrange, ArrangeConfig, AudioController};
pub use wav::SampleBuffer;
