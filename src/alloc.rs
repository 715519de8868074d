//! Byte allocation capability used by [`StringSet`](crate::StringSet)
//! construction.
//!
//! Buffers are released by `Drop`, so there is no `free`. Every
//! construction path that gets an `Err` back from an allocator drops
//! whatever it already holds before returning, which keeps error paths
//! leak-free without manual bookkeeping.

use thiserror::Error;

/// The allocator could not satisfy a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("failed to allocate {size} bytes")]
pub struct AllocError {
    /// Number of bytes requested
    pub size: usize,
}

impl From<AllocError> for crate::Error {
    fn from(e: AllocError) -> Self {
        crate::Error::AllocationFailure { size: e.size }
    }
}

/// Source of zeroed byte buffers.
pub trait ByteAllocator {
    /// Return a zero-filled buffer of exactly `size` bytes.
    fn allocate(&self, size: usize) -> Result<Vec<u8>, AllocError>;
}

impl<A: ByteAllocator + ?Sized> ByteAllocator for &A {
    fn allocate(&self, size: usize) -> Result<Vec<u8>, AllocError> {
        (**self).allocate(size)
    }
}

/// The process-wide allocator, with out-of-memory reported as an error
/// rather than an abort.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalAllocator;

impl ByteAllocator for GlobalAllocator {
    fn allocate(&self, size: usize) -> Result<Vec<u8>, AllocError> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(size)
            .map_err(|_| AllocError { size })?;
        buf.resize(size, 0);
        Ok(buf)
    }
}

/// Reserve room for `additional` elements of `T`, mapping failure to
/// [`crate::Error::AllocationFailure`].
pub(crate) fn try_reserve<T>(v: &mut Vec<T>, additional: usize) -> crate::Result<()> {
    v.try_reserve_exact(additional)
        .map_err(|_| crate::Error::AllocationFailure {
            size: additional.saturating_mul(std::mem::size_of::<T>()),
        })
}
