use core::{
    cell::Cell,
    ptr::NonNull,
};

use kasvu_mem::Allocator;

/// Wraps an allocator with a byte budget and one-shot failure injection.
///
/// Requests that would take the live byte count over `limit` fail, as
/// does the first request after [`fail_next`](Self::fail_next).
pub struct LimitAlloc<A: Allocator> {
    inner: A,
    limit: Cell<usize>,
    live: Cell<usize>,
    peak: Cell<usize>,
    failures: Cell<usize>,
    fail_next: Cell<bool>,
}

impl<A: Allocator> LimitAlloc<A> {

    pub fn new(inner: A, limit: usize) -> Self {
        Self {
            inner,
            limit: Cell::new(limit),
            live: Cell::new(0),
            peak: Cell::new(0),
            failures: Cell::new(0),
            fail_next: Cell::new(false),
        }
    }

    #[inline(always)]
    pub fn limit(&self) -> usize {
        self.limit.get()
    }

    #[inline(always)]
    pub fn set_limit(&self, limit: usize) {
        self.limit.set(limit)
    }

    /// Bytes currently handed out.
    #[inline(always)]
    pub fn live(&self) -> usize {
        self.live.get()
    }

    #[inline(always)]
    pub fn peak(&self) -> usize {
        self.peak.get()
    }

    /// Number of requests refused so far.
    #[inline(always)]
    pub fn failures(&self) -> usize {
        self.failures.get()
    }

    /// Makes the next allocation or reallocation fail.
    #[inline(always)]
    pub fn fail_next(&self) {
        self.fail_next.set(true)
    }

    #[inline(always)]
    pub fn inner(&self) -> &A {
        &self.inner
    }

    fn admit(&self, live_after: Option<usize>) -> bool {
        let within = live_after.is_some_and(|live| live <= self.limit.get());
        if self.fail_next.replace(false) || !within {
            self.failures.set(self.failures.get() + 1);
            return false
        }
        true
    }

    fn set_live(&self, live: usize) {
        self.live.set(live);
        self.peak.set(self.peak.get().max(live));
    }
}

impl<A: Allocator> Allocator for LimitAlloc<A> {

    unsafe fn allocate_raw(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        let live_after = self.live.get().checked_add(size);
        if !self.admit(live_after) {
            return None
        }
        let ptr = unsafe { self.inner.allocate_raw(size, align)? };
        self.set_live(self.live.get() + size);
        Some(ptr)
    }

    unsafe fn reallocate_raw(
        &self,
        ptr: NonNull<u8>,
        old_size: usize,
        align: usize,
        new_size: usize,
    ) -> Option<NonNull<u8>>
    {
        let live_after = (self.live.get() - old_size).checked_add(new_size);
        if !self.admit(live_after) {
            return None
        }
        let ptr = unsafe { self.inner.reallocate_raw(ptr, old_size, align, new_size)? };
        self.set_live(self.live.get() - old_size + new_size);
        Some(ptr)
    }

    unsafe fn free_raw(&self, ptr: NonNull<u8>, size: usize, align: usize) {
        self.live.set(self.live.get() - size);
        unsafe { self.inner.free_raw(ptr, size, align) }
    }
}
