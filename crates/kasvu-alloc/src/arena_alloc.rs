use std::alloc::{alloc, dealloc, Layout};

use core::{
    mem,
    cell::Cell,
    ptr::NonNull,
};

use kasvu_mem::{Allocator, align_up};

/// Fixed-size bump allocator.
///
/// Frees are no-ops; memory comes back only through [`clear`](Self::clear)
/// or an [`ArenaGuard`] going out of scope. While a guard is alive the
/// arena itself refuses every request; allocate through the guard. Once the arena is exhausted
/// every request fails, which makes it a natural way to bound how far a
/// [`DynArray`](kasvu_mem::DynArray) may grow.
pub struct ArenaAlloc {
    data: NonNull<u8>,
    size: usize,
    pos: Cell<usize>,
    guard_active: Cell<bool>,
}

impl ArenaAlloc {

    pub fn new(size: usize) -> Option<Self> {
        let layout = Layout::from_size_align(size, mem::align_of::<usize>()).ok()?;
        if layout.size() == 0 {
            return None
        }
        let ptr = unsafe { alloc(layout) };
        Some(
            Self {
                data: NonNull::new(ptr)?,
                size,
                pos: Cell::new(0),
                guard_active: Cell::new(false),
            }
        )
    }

    #[inline(always)]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline(always)]
    pub fn used(&self) -> usize {
        self.pos.get()
    }

    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.size - self.used()
    }

    #[inline(always)]
    pub fn full(&self) -> bool {
        self.used() >= self.size
    }

    /// Resets the bump position to 0.
    ///
    /// # Safety
    /// No block handed out by this arena may be used afterwards.
    #[inline(always)]
    pub unsafe fn clear(&mut self) {
        assert!(!self.guard_active.get(), "attempting to clear while guard is active");
        self.pos.set(0);
    }

    #[inline(always)]
    unsafe fn allocate_raw_internal(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        let base = self.data.as_ptr() as usize;
        let aligned_start = align_up(base + self.used(), align);
        let end = aligned_start.checked_add(size)?;
        if end > base + self.size {
            return None
        }
        self.pos.set(end - base);
        Some(
            unsafe {
                NonNull::new_unchecked(aligned_start as *mut u8)
            }
        )
    }

    /// Grows or shrinks the most recent block in place, otherwise moves it
    /// to a fresh block.
    #[inline(always)]
    unsafe fn reallocate_raw_internal(
        &self,
        ptr: NonNull<u8>,
        old_size: usize,
        align: usize,
        new_size: usize,
    ) -> Option<NonNull<u8>>
    {
        let base = self.data.as_ptr() as usize;
        let start = ptr.as_ptr() as usize;
        if start + old_size == base + self.used() {
            let end = start.checked_add(new_size)?;
            if end > base + self.size {
                return None
            }
            self.pos.set(end - base);
            return Some(ptr)
        }
        let new_ptr = unsafe { self.allocate_raw_internal(new_size, align)? };
        unsafe { ptr.copy_to_nonoverlapping(new_ptr, old_size.min(new_size)) };
        Some(new_ptr)
    }
}

impl Allocator for ArenaAlloc {

    #[inline(always)]
    unsafe fn allocate_raw(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        if self.guard_active.get() {
            return None
        }
        unsafe { self.allocate_raw_internal(size, align) }
    }

    #[inline(always)]
    unsafe fn reallocate_raw(
        &self,
        ptr: NonNull<u8>,
        old_size: usize,
        align: usize,
        new_size: usize,
    ) -> Option<NonNull<u8>>
    {
        if self.guard_active.get() {
            return None
        }
        unsafe { self.reallocate_raw_internal(ptr, old_size, align, new_size) }
    }

    #[inline(always)]
    unsafe fn free_raw(&self, _ptr: NonNull<u8>, _size: usize, _align: usize) {}
}

impl Drop for ArenaAlloc {

    fn drop(&mut self) {
        unsafe {
            let layout = Layout::from_size_align_unchecked(self.size, mem::align_of::<usize>());
            dealloc(self.data.as_ptr(), layout);
        }
    }
}

/// Scoped allocator over an [`ArenaAlloc`] that rolls the arena back to
/// where it was when the guard was created.
pub struct ArenaGuard<'a> {
    pos_rollback: usize,
    arena: &'a ArenaAlloc,
}

impl<'a> ArenaGuard<'a> {

    #[inline(always)]
    pub fn new(arena: &'a ArenaAlloc) -> Self {
        assert!(!arena.guard_active.get(), "attempting to create concurrent guards");
        arena.guard_active.set(true);
        Self {
            arena,
            pos_rollback: arena.used(),
        }
    }

    #[inline(always)]
    pub fn size(&self) -> usize {
        self.arena.size()
    }

    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.arena.remaining()
    }

    /// Rolls the arena back early.
    ///
    /// # Safety
    /// No block handed out through this guard may be used afterwards.
    #[inline(always)]
    pub unsafe fn clear(&mut self) {
        self.arena.pos.set(self.pos_rollback);
    }
}

impl<'a> Allocator for ArenaGuard<'a> {

    #[inline(always)]
    unsafe fn allocate_raw(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        unsafe { self.arena.allocate_raw_internal(size, align) }
    }

    #[inline(always)]
    unsafe fn reallocate_raw(
        &self,
        ptr: NonNull<u8>,
        old_size: usize,
        align: usize,
        new_size: usize,
    ) -> Option<NonNull<u8>>
    {
        unsafe { self.arena.reallocate_raw_internal(ptr, old_size, align, new_size) }
    }

    #[inline(always)]
    unsafe fn free_raw(&self, _ptr: NonNull<u8>, _size: usize, _align: usize) {}
}

impl<'a> Drop for ArenaGuard<'a> {

    fn drop(&mut self) {
        self.arena.pos.set(self.pos_rollback);
        self.arena.guard_active.set(false);
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn bump_allocations_respect_alignment() {
        let arena = ArenaAlloc::new(256).unwrap();
        unsafe {
            let a = arena.allocate_raw(3, 1).unwrap();
            let b = arena.allocate_raw(8, 8).unwrap();
            assert_eq!(b.as_ptr() as usize % 8, 0);
            assert!(b.as_ptr() as usize >= a.as_ptr() as usize + 3);
        }
        assert!(arena.used() >= 11);
    }

    #[test]
    fn exhausted_arena_fails() {
        let arena = ArenaAlloc::new(64).unwrap();
        unsafe {
            assert!(arena.allocate_raw(48, 8).is_some());
            assert!(arena.allocate_raw(32, 8).is_none());
            assert!(arena.allocate_raw(16, 8).is_some());
        }
        assert!(arena.full());
    }

    #[test]
    fn last_block_grows_in_place() {
        let arena = ArenaAlloc::new(128).unwrap();
        unsafe {
            let ptr = arena.allocate_raw(16, 8).unwrap();
            ptr.write(9);
            let grown = arena.reallocate_raw(ptr, 16, 8, 64).unwrap();
            assert_eq!(grown, ptr);
            assert_eq!(grown.read(), 9);
        }
        assert_eq!(arena.used(), 64);
    }

    #[test]
    fn earlier_block_moves_on_growth() {
        let arena = ArenaAlloc::new(128).unwrap();
        unsafe {
            let first = arena.allocate_raw(8, 8).unwrap();
            first.write(5);
            let _second = arena.allocate_raw(8, 8).unwrap();
            let moved = arena.reallocate_raw(first, 8, 8, 16).unwrap();
            assert_ne!(moved, first);
            assert_eq!(moved.read(), 5);
        }
        assert_eq!(arena.used(), 32);
    }

    #[test]
    fn failed_in_place_growth_keeps_position() {
        let arena = ArenaAlloc::new(32).unwrap();
        unsafe {
            let ptr = arena.allocate_raw(16, 8).unwrap();
            assert!(arena.reallocate_raw(ptr, 16, 8, 64).is_none());
        }
        assert_eq!(arena.used(), 16);
    }

    #[test]
    fn guard_rolls_back_on_drop() {
        let mut arena = ArenaAlloc::new(128).unwrap();
        unsafe { arena.allocate_raw(16, 8).unwrap(); }
        {
            let guard = ArenaGuard::new(&arena);
            unsafe { guard.allocate_raw(64, 8).unwrap(); }
            assert_eq!(guard.remaining(), 48);
        }
        assert_eq!(arena.used(), 16);
        unsafe { arena.clear(); }
        assert_eq!(arena.used(), 0);
    }

    #[test]
    fn arena_refuses_requests_under_guard() {
        let arena = ArenaAlloc::new(64).unwrap();
        let ptr = unsafe { arena.allocate_raw(8, 8).unwrap() };
        {
            let _guard = ArenaGuard::new(&arena);
            unsafe {
                assert!(arena.allocate_raw(8, 8).is_none());
                assert!(arena.reallocate_raw(ptr, 8, 8, 16).is_none());
            }
            assert_eq!(arena.used(), 8);
        }
        unsafe { assert!(arena.reallocate_raw(ptr, 8, 8, 16).is_some()); }
        assert_eq!(arena.used(), 16);
    }
}
