use std::marker::PhantomData;

/// An output buffer lent to every tile of one run.
///
/// Tiles of a run partition the output, so each callback may take a mutable view of the byte
/// range backing its own cells while other threads do the same for theirs.
pub struct SharedOut<'a> {
    ptr: *mut u8,
    len: usize,
    _buf: PhantomData<&'a mut [u8]>,
}

// SAFETY: `SharedOut` only hands out `&mut [u8]` through `range_mut`, whose contract requires
// callers to keep concurrently borrowed ranges disjoint.
unsafe impl Send for SharedOut<'_> {}
unsafe impl Sync for SharedOut<'_> {}

impl<'a> SharedOut<'a> {
    /// Take exclusive ownership of `buf` for the lifetime of the wrapper.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self {
            ptr: buf.as_mut_ptr(),
            len: buf.len(),
            _buf: PhantomData,
        }
    }

    /// Total length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Return `true` for a zero-length buffer.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Mutable view of `start..end`.
    ///
    /// # Panics
    ///
    /// If the range is inverted or runs past the buffer.
    ///
    /// # Safety
    ///
    /// No other reference to any byte of `start..end` may be alive while the returned slice
    /// is. Kernels satisfy this by only touching the cells of the tile they were given.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn range_mut(&self, start: usize, end: usize) -> &mut [u8] {
        assert!(
            start <= end && end <= self.len,
            "range {start}..{end} outside buffer of {} bytes",
            self.len
        );
        // SAFETY: bounds checked above; exclusivity is the caller's contract.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.add(start), end - start) }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/exec/shared.rs"]
mod tests;
