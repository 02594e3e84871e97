use std::sync::{Mutex, PoisonError};

/// One slot of `T` per participating thread, addressed by `Tile::thread_index`.
///
/// Thread indices are unique among concurrently running callbacks, so each slot's lock is
/// never contended during a run.
pub struct ThreadScratch<T> {
    slots: Vec<Mutex<T>>,
}

impl<T> ThreadScratch<T> {
    /// Build `threads` slots with `init`.
    pub fn new(threads: usize, mut init: impl FnMut() -> T) -> Self {
        Self {
            slots: (0..threads).map(|_| Mutex::new(init())).collect(),
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Return `true` when there are no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Run `f` with exclusive access to the slot of `thread_index`.
    ///
    /// # Panics
    ///
    /// If `thread_index` has no slot.
    pub fn with<R>(&self, thread_index: usize, f: impl FnOnce(&mut T) -> R) -> R {
        let mut slot = self.slots[thread_index]
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut slot)
    }

    /// Consume the scratch and return every slot, ordered by thread index.
    pub fn into_inner(self) -> Vec<T> {
        self.slots
            .into_iter()
            .map(|m| m.into_inner().unwrap_or_else(PoisonError::into_inner))
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/exec/scratch.rs"]
mod tests;
