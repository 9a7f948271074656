//! Rendering pipeline
//!
//! - Arranger: maps a parsed sheet onto timed sound elements
//! - AudioController: sweeps the timeline and sums active elements into samples

pub mod arrange;
pub mod controller;

pub use arrange::{arrange, ArrangeConfig, Instrument};
pub use controller::{AudioController, Placement, PlacementId, RenderError};
