//! Experience replay buffer

use rand::Rng;

use deepq_core::Transition;

/// Bounded replay buffer with ring-buffer eviction.
///
/// Holds up to `capacity` transitions; once full, each insert overwrites
/// the oldest entry. Sampling is uniform with replacement over the current
/// contents. No prioritization.
#[derive(Debug, Clone)]
pub struct ReplayBuffer {
    /// Buffer storage
    buffer: Vec<Transition>,
    /// Maximum capacity
    capacity: usize,
    /// Insertion cursor for ring semantics
    position: usize,
}

impl ReplayBuffer {
    /// Create a new replay buffer.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "replay buffer capacity must be non-zero");
        Self {
            buffer: Vec::with_capacity(capacity),
            capacity,
            position: 0,
        }
    }

    /// Add a transition, evicting the oldest entry once at capacity.
    pub fn push(&mut self, transition: Transition) {
        if self.buffer.len() < self.capacity {
            self.buffer.push(transition);
        } else {
            self.buffer[self.position] = transition;
        }
        self.position = (self.position + 1) % self.capacity;
    }

    /// Sample `batch_size` transitions uniformly, with replacement.
    ///
    /// # Panics
    /// Panics if the buffer is empty. Callers gate on a warm-up threshold
    /// before sampling; an empty sample indicates that gate was skipped.
    pub fn sample<R: Rng>(&self, batch_size: usize, rng: &mut R) -> Vec<Transition> {
        assert!(
            !self.buffer.is_empty(),
            "sample from empty replay buffer: warm-up gate was not honored"
        );
        (0..batch_size)
            .map(|_| self.buffer[rng.gen_range(0..self.buffer.len())].clone())
            .collect()
    }

    /// Current occupancy, at most `capacity`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
