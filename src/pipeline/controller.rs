//! Audio controller
//!
//! Holds sound elements placed on a timeline and renders them into a
//! sample buffer by sweeping time at a fixed sample rate.

use crate::generator::{EnvelopeDomainError, Sound, SoundElement};
use crate::wav::SampleBuffer;
use std::fmt;

/// Identifier handed out when an element is placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlacementId(pub usize);

impl fmt::Display for PlacementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An element starting `offset` seconds into the render
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub id: PlacementId,
    pub offset: f64,
    pub element: SoundElement,
}

impl Placement {
    /// Time at which the element stops contributing
    pub fn end(&self) -> f64 {
        self.offset + self.element.duration()
    }
}

/// An element failed while being evaluated
#[derive(Debug, Clone, PartialEq)]
pub struct RenderError {
    pub placement: PlacementId,
    pub source: EnvelopeDomainError,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Placement {} failed: {}", self.placement, self.source)
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Timeline of placed sound elements
pub struct AudioController {
    /// Render length in seconds
    duration: f64,
    /// Sample rate in Hz
    sample_rate: u32,
    placements: Vec<Placement>,
}

impl AudioController {
    /// Create an empty controller
    ///
    /// # Arguments
    /// * `duration` - Render length in seconds, clamped to 0 when negative
    /// * `sample_rate` - Sample rate in Hz
    pub fn new(duration: f64, sample_rate: u32) -> Self {
        Self {
            duration: duration.max(0.0),
            sample_rate,
            placements: Vec::new(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Number of samples `render` produces
    pub fn sample_count(&self) -> usize {
        (self.duration * self.sample_rate as f64).floor() as usize
    }

    /// Place an element at `offset` seconds
    ///
    /// Placing an identical element at the same offset twice keeps a single
    /// copy and returns the id of the existing placement.
    pub fn add_element(&mut self, offset: f64, element: impl Into<SoundElement>) -> PlacementId {
        let element = element.into();
        if let Some(existing) = self
            .placements
            .iter()
            .find(|p| p.offset == offset && p.element == element)
        {
            return existing.id;
        }

        let id = PlacementId(self.placements.len());
        self.placements.push(Placement {
            id,
            offset,
            element,
        });
        id
    }

    /// Render all placements into a new buffer
    ///
    /// Placements are admitted in offset order once `offset <= t` and dropped
    /// once `offset + duration < t`, so an element still contributes on the
    /// sample that lands exactly on its end. Sums are not clipped.
    ///
    /// # Example
    /// ```
    /// use tonesheet::generator::{Envelope, Harmonic};
    /// use tonesheet::pipeline::AudioController;
    ///
    /// let mut ac = AudioController::new(1.0, 8000);
    /// ac.add_element(0.0, Harmonic::new(440.0, 1.0, 0.5, Envelope::SqrtFade));
    /// let buffer = ac.render().unwrap();
    /// assert_eq!(buffer.len(), 8000);
    /// ```
    pub fn render(&self) -> Result<SampleBuffer, RenderError> {
        let rate = self.sample_rate as f64;
        let total_samples = self.sample_count();

        let placements = &self.placements;
        let mut order: Vec<usize> = (0..placements.len()).collect();
        order.sort_by(|&a, &b| placements[a].offset.total_cmp(&placements[b].offset));

        let late = placements.iter().filter(|p| p.offset >= self.duration).count();
        if late > 0 {
            eprintln!(
                "WARNING: {} placement(s) start at or after the end of the {}s render",
                late, self.duration
            );
        }

        let mut buffer = SampleBuffer::with_capacity(self.sample_rate, total_samples);
        // Indices into `placements`, in admission order
        let mut active: Vec<usize> = Vec::new();
        let mut next = 0;

        for n in 0..total_samples {
            let t = n as f64 / rate;

            while next < order.len() && placements[order[next]].offset <= t {
                active.push(order[next]);
                next += 1;
            }

            // Same test as `offset + duration < t`, but on the local time that
            // is passed to the element so rounding cannot put it past its end
            active.retain(|&i| t - placements[i].offset <= placements[i].element.duration());

            let mut value = 0.0;
            for &i in &active {
                let placement = &placements[i];
                value += placement
                    .element
                    .value(t - placement.offset)
                    .map_err(|source| RenderError {
                        placement: placement.id,
                        source,
                    })?;
            }
            buffer.push(value as f32);
        }

        Ok(buffer)
    }
}
