use core::ptr::NonNull;

use kasvu_mem::Allocator;
use kasvu_log::{trace, warn};

/// Wraps an allocator and traces every request it serves.
///
/// Successful requests are logged at trace level, refused ones at warn
/// level, both under the `name` given at construction.
pub struct LogAlloc<A: Allocator> {
    inner: A,
    name: &'static str,
}

impl<A: Allocator> LogAlloc<A> {

    pub fn new(inner: A, name: &'static str) -> Self {
        Self {
            inner,
            name,
        }
    }

    #[inline(always)]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline(always)]
    pub fn inner(&self) -> &A {
        &self.inner
    }
}

impl<A: Allocator> Allocator for LogAlloc<A> {

    unsafe fn allocate_raw(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        let ptr = unsafe { self.inner.allocate_raw(size, align) };
        match ptr {
            Some(ptr) => trace!("{}: allocated {} bytes at {:p}", self.name, size, ptr),
            None => warn!("{}: failed to allocate {} bytes (align {})", self.name, size, align),
        };
        ptr
    }

    unsafe fn reallocate_raw(
        &self,
        ptr: NonNull<u8>,
        old_size: usize,
        align: usize,
        new_size: usize,
    ) -> Option<NonNull<u8>>
    {
        let new_ptr = unsafe { self.inner.reallocate_raw(ptr, old_size, align, new_size) };
        match new_ptr {
            Some(new_ptr) => trace!(
                "{}: reallocated {} -> {} bytes, {:p} -> {:p}",
                self.name, old_size, new_size, ptr, new_ptr,
            ),
            None => warn!(
                "{}: failed to reallocate {} -> {} bytes at {:p}",
                self.name, old_size, new_size, ptr,
            ),
        };
        new_ptr
    }

    unsafe fn free_raw(&self, ptr: NonNull<u8>, size: usize, align: usize) {
        trace!("{}: freed {} bytes at {:p}", self.name, size, ptr);
        unsafe { self.inner.free_raw(ptr, size, align) }
    }
}
