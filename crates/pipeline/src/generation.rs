use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonically increasing tag stamped on every refresh batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issues generations and tells whether a given one is still the latest.
///
/// Generation 0 is the empty initial state; the first issued tag is 1.
#[derive(Debug, Default)]
pub struct GenerationCounter {
    latest: AtomicU64,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new batch, superseding every earlier one.
    pub fn next(&self) -> Generation {
        Generation(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn latest(&self) -> Generation {
        Generation(self.latest.load(Ordering::SeqCst))
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.latest() == generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_generations_supersede_older_ones() {
        let counter = GenerationCounter::new();
        assert_eq!(counter.latest(), Generation::default());

        let first = counter.next();
        assert!(counter.is_current(first));

        let second = counter.next();
        assert!(second > first);
        assert!(!counter.is_current(first));
        assert!(counter.is_current(second));
        assert_eq!(second.value(), 2);
    }
}
