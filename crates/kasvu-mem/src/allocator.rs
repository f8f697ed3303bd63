use core::ptr::NonNull;

/// Source of raw memory for the containers in this crate.
///
/// Every method is `unsafe`: callers pass back exactly the size and
/// alignment a block was obtained with, and never touch a block after
/// it has been freed or reallocated.
pub trait Allocator {

    unsafe fn allocate_raw(&self, size: usize, align: usize) -> Option<NonNull<u8>>;

    /// Resizes the block at `ptr` to `new_size` bytes, preserving the first
    /// `min(old_size, new_size)` bytes.
    ///
    /// Returns `None` on failure, in which case the old block is still
    /// owned by the caller and its contents are untouched.
    unsafe fn reallocate_raw(
        &self,
        ptr: NonNull<u8>,
        old_size: usize,
        align: usize,
        new_size: usize,
    ) -> Option<NonNull<u8>>
    {
        let new_ptr = unsafe { self.allocate_raw(new_size, align)? };
        unsafe {
            ptr.copy_to_nonoverlapping(new_ptr, old_size.min(new_size));
            self.free_raw(ptr, old_size, align);
        }
        Some(new_ptr)
    }

    unsafe fn free_raw(&self, ptr: NonNull<u8>, size: usize, align: usize);

    unsafe fn allocate_uninit<T>(&self, count: usize) -> Option<NonNull<T>> {
        let size = size_of!(T).checked_mul(count)?;
        let align = align_of!(T);
        unsafe { self.allocate_raw(size, align).map(|ptr| ptr.cast::<T>()) }
    }

    unsafe fn reallocate_uninit<T>(
        &self,
        ptr: NonNull<T>,
        old_count: usize,
        new_count: usize,
    ) -> Option<NonNull<T>>
    {
        let old_size = size_of!(T).checked_mul(old_count)?;
        let new_size = size_of!(T).checked_mul(new_count)?;
        let align = align_of!(T);
        unsafe {
            self.reallocate_raw(ptr.cast::<u8>(), old_size, align, new_size)
                .map(|ptr| ptr.cast::<T>())
        }
    }

    unsafe fn free_uninit<T>(&self, ptr: NonNull<T>, count: usize) {
        let size = size_of!(T) * count;
        let align = align_of!(T);
        unsafe { self.free_raw(ptr.cast::<u8>(), size, align) }
    }
}

impl<A: Allocator + ?Sized> Allocator for &A {

    #[inline(always)]
    unsafe fn allocate_raw(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        unsafe { (**self).allocate_raw(size, align) }
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
        unsafe { (**self).reallocate_raw(ptr, old_size, align, new_size) }
    }

    #[inline(always)]
    unsafe fn free_raw(&self, ptr: NonNull<u8>, size: usize, align: usize) {
        unsafe { (**self).free_raw(ptr, size, align) }
    }
}
