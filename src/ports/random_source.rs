//! Randomness port.
//!
//! Phrase selection and recommendation jitter draw from this, so tests can
//! pin outcomes with a seeded source.

pub trait RandomSource: Send + Sync {
    /// Uniform value in `[0, 1)`.
    fn next_unit(&self) -> f64;

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn pick_index(&self, len: usize) -> usize {
        let idx = (self.next_unit() * len as f64) as usize;
        idx.min(len.saturating_sub(1))
    }
}
