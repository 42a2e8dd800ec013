#![forbid(unsafe_code)]

//! Injectable randomness port for the stop-resolution draw.
//!
//! The session machine consumes exactly one uniform value per accepted stop
//! request. Injecting the source keeps the machine pure and makes the
//! resolution branch deterministic under test.

use rand::Rng;

/// Uniform random source over `[0, 1)`.
pub trait RandomSource {
    /// Next uniform value in `[0, 1)`.
    fn next_unit(&mut self) -> f32;
}

/// Production source backed by the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl ThreadRandom {
    /// Create a new thread-local source.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl RandomSource for ThreadRandom {
    fn next_unit(&mut self) -> f32 {
        rand::thread_rng().r#gen::<f32>()
    }
}

/// Fixed-sequence source for deterministic tests and scripted playback.
///
/// Yields the scripted values in order; once exhausted, the last value
/// repeats indefinitely.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    values: Vec<f32>,
    next: usize,
}

impl ScriptedRandom {
    /// Create a source yielding `values` in order.
    ///
    /// # Panics
    /// Panics if `values` is empty.
    #[must_use]
    pub fn new(values: impl Into<Vec<f32>>) -> Self {
        let values = values.into();
        assert!(!values.is_empty(), "ScriptedRandom needs at least one value");
        Self { values, next: 0 }
    }

    /// Source that always resolves a stop attempt successfully.
    #[must_use]
    pub fn always_success() -> Self {
        Self::new([0.0])
    }

    /// Source that always resolves a stop attempt unsuccessfully.
    #[must_use]
    pub fn always_failure() -> Self {
        Self::new([0.9])
    }
}

impl RandomSource for ScriptedRandom {
    fn next_unit(&mut self) -> f32 {
        let index = self.next.min(self.values.len() - 1);
        if self.next < self.values.len() {
            self.next += 1;
        }
        self.values[index]
    }
}
