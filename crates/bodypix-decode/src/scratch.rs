//! Scoped intermediate buffers for the parallel engine.
//!
//! Every intermediate array of a batched assignment pass is allocated through a
//! [`ScratchArena`], which hands back a [`ScratchBuffer`] guard. Dropping the
//! guard releases the buffer and its byte count, so a pass that returns early
//! with an error leaves nothing behind. [`ScratchArena::live_bytes`] reports
//! what is still held and returns to zero once every pass has finished.

use ndarray::{ArrayBase, Dimension, OwnedRepr};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Types whose heap footprint the arena can account for.
pub trait ScratchSized {
    /// Heap bytes owned by this value.
    fn scratch_bytes(&self) -> usize;
}

impl<T, D: Dimension> ScratchSized for ArrayBase<OwnedRepr<T>, D> {
    fn scratch_bytes(&self) -> usize {
        self.len() * std::mem::size_of::<T>()
    }
}

impl<T> ScratchSized for Vec<T> {
    fn scratch_bytes(&self) -> usize {
        self.len() * std::mem::size_of::<T>()
    }
}

#[derive(Debug, Default)]
struct ArenaCounters {
    live_bytes: AtomicUsize,
    live_buffers: AtomicUsize,
    peak_bytes: AtomicUsize,
}

/// Byte accounting for scratch buffers, shared by every clone.
#[derive(Debug, Clone, Default)]
pub struct ScratchArena {
    counters: Arc<ArenaCounters>,
}

impl ScratchArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `value` for the lifetime of the returned guard.
    pub fn alloc<T: ScratchSized>(&self, value: T) -> ScratchBuffer<T> {
        let bytes = value.scratch_bytes();
        let live = self.counters.live_bytes.fetch_add(bytes, Ordering::AcqRel) + bytes;
        self.counters.live_buffers.fetch_add(1, Ordering::AcqRel);
        self.counters.peak_bytes.fetch_max(live, Ordering::AcqRel);
        ScratchBuffer {
            value,
            bytes,
            counters: Arc::clone(&self.counters),
        }
    }

    /// Bytes held by guards that have not been dropped.
    pub fn live_bytes(&self) -> usize {
        self.counters.live_bytes.load(Ordering::Acquire)
    }

    /// Number of guards that have not been dropped.
    pub fn live_buffers(&self) -> usize {
        self.counters.live_buffers.load(Ordering::Acquire)
    }

    /// Highest `live_bytes` seen so far.
    pub fn peak_bytes(&self) -> usize {
        self.counters.peak_bytes.load(Ordering::Acquire)
    }
}

/// A buffer whose bytes are released from its arena on drop.
#[derive(Debug)]
pub struct ScratchBuffer<T> {
    value: T,
    bytes: usize,
    counters: Arc<ArenaCounters>,
}

impl<T: Default> ScratchBuffer<T> {
    /// Move the value out, releasing the accounting.
    pub fn into_inner(mut self) -> T {
        std::mem::take(&mut self.value)
    }
}

impl<T> Deref for ScratchBuffer<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for ScratchBuffer<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T> Drop for ScratchBuffer<T> {
    fn drop(&mut self) {
        self.counters
            .live_bytes
            .fetch_sub(self.bytes, Ordering::AcqRel);
        self.counters.live_buffers.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_alloc_and_release() {
        let arena = ScratchArena::new();
        {
            let a = arena.alloc(Array2::<f32>::zeros((4, 4)));
            let b = arena.alloc(vec![0_i32; 10]);
            assert_eq!(a.len(), 16);
            assert_eq!(b.len(), 10);
            assert_eq!(arena.live_bytes(), 16 * 4 + 10 * 4);
            assert_eq!(arena.live_buffers(), 2);
        }
        assert_eq!(arena.live_bytes(), 0);
        assert_eq!(arena.live_buffers(), 0);
        assert_eq!(arena.peak_bytes(), 104);
    }

    #[test]
    fn test_into_inner_releases() {
        let arena = ScratchArena::new();
        let buf = arena.alloc(vec![1_u8; 8]);
        let clone = arena.clone();
        assert_eq!(clone.live_bytes(), 8);
        let inner = buf.into_inner();
        assert_eq!(inner, vec![1_u8; 8]);
        assert_eq!(arena.live_bytes(), 0);
    }

    #[test]
    fn test_release_on_early_return() {
        fn failing(arena: &ScratchArena) -> Result<(), String> {
            let _held = arena.alloc(vec![0.0_f32; 32]);
            Err("shape mismatch".to_string())
        }

        let arena = ScratchArena::new();
        assert!(failing(&arena).is_err());
        assert_eq!(arena.live_bytes(), 0);
    }
}
