use core::{
    cmp::Ordering,
    fmt,
    marker::PhantomData,
    ops::{Index, IndexMut},
    ptr::NonNull,
    slice,
};

use crate::{
    allocator::Allocator,
    capacity_policy::CapacityPolicy,
    errors::CapacityError,
};

#[cfg(feature = "std")]
use crate::{
    capacity_policy::Doubling,
    global_alloc::{GlobalAlloc, GLOBAL_ALLOC},
};

use super::{Iter, IterMut, Result};

use CapacityError::{AllocFailed, IndexOutOfBounds};

/// A contiguous, growable array of `Copy` values.
///
/// Memory comes from `Alloc` and grows as dictated by `Policy`. Appending
/// to a full array reallocates the buffer; if that fails the array is left
/// exactly as it was and [`out_of_memory`](Self::out_of_memory) reports
/// `true` until the next successful append.
///
/// Elements are never dropped. Whatever an element refers to is the
/// caller's to manage.
pub struct DynArray<'alloc, T, Alloc, Policy>
    where
        T: Copy,
        Alloc: Allocator,
        Policy: CapacityPolicy,
{
    data: NonNull<T>,
    len: usize,
    capacity: usize,
    // slots held in `data`, which `clear` does not forget
    allocated: usize,
    oom: bool,
    alloc: &'alloc Alloc,
    _markers: PhantomData<(T, Policy)>,
}

unsafe impl<'alloc, T, Alloc, Policy> Send for DynArray<'alloc, T, Alloc, Policy>
    where
        T: Copy + Send,
        Alloc: Allocator + Sync,
        Policy: CapacityPolicy,
{}

unsafe impl<'alloc, T, Alloc, Policy> Sync for DynArray<'alloc, T, Alloc, Policy>
    where
        T: Copy + Sync,
        Alloc: Allocator + Sync,
        Policy: CapacityPolicy,
{}

/// [`DynArray`] backed by the process allocator.
#[cfg(feature = "std")]
pub type GlobalArray<T> = DynArray<'static, T, GlobalAlloc, Doubling>;

#[cfg(feature = "std")]
const_assert!(size_of!(GlobalArray<u32>) == size_of!(Option<GlobalArray<u32>>));

#[cfg(feature = "std")]
impl<T: Copy> GlobalArray<T> {

    #[inline(always)]
    pub const fn new() -> Self {
        Self::new_in(&GLOBAL_ALLOC)
    }
}

#[cfg(feature = "std")]
impl<T: Copy> Default for GlobalArray<T> {

    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl<'alloc, T, Alloc, Policy> DynArray<'alloc, T, Alloc, Policy>
    where
        T: Copy,
        Alloc: Allocator,
        Policy: CapacityPolicy,
{

    /// Creates an empty array. Nothing is allocated until the first push.
    #[inline(always)]
    pub const fn new_in(alloc: &'alloc Alloc) -> Self {
        Self {
            data: NonNull::dangling(),
            len: 0,
            capacity: 0,
            allocated: 0,
            oom: false,
            alloc,
            _markers: PhantomData,
        }
    }

    /// Resets every field to the empty state without releasing the buffer.
    ///
    /// Only meant for an array that holds no buffer, or whose buffer the
    /// caller has already released. A held buffer is leaked.
    #[inline(always)]
    pub fn init(&mut self) {
        self.data = NonNull::dangling();
        self.len = 0;
        self.capacity = 0;
        self.allocated = 0;
        self.oom = false;
    }

    /// Releases the buffer and returns to the empty state.
    ///
    /// Calling this on an empty or already terminated array does nothing.
    pub fn terminate(&mut self) {
        debug_assert!(self.len <= self.capacity);
        if self.allocated != 0 {
            unsafe { self.alloc.free_uninit(self.data, self.allocated) }
        }
        self.init();
    }

    /// Forgets all elements and the capacity, keeping the buffer.
    ///
    /// The next push grows from zero capacity again by reallocating the
    /// kept buffer. The buffer is released by [`terminate`](Self::terminate)
    /// or on drop.
    #[inline(always)]
    pub fn clear(&mut self) {
        self.len = 0;
        self.capacity = 0;
        self.oom = false;
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether the last push failed to obtain memory.
    #[inline(always)]
    pub fn out_of_memory(&self) -> bool {
        self.oom
    }

    #[inline(always)]
    pub fn allocator(&self) -> &'alloc Alloc {
        self.alloc
    }

    #[inline(always)]
    pub fn as_ptr(&self) -> *const T {
        self.data.as_ptr()
    }

    #[inline(always)]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.data.as_ptr()
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.data.as_ptr(), self.len) }
    }

    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { slice::from_raw_parts_mut(self.data.as_ptr(), self.len) }
    }

    fn grow(&mut self) -> Result<()> {
        let new_capacity = Policy::grow(self.capacity, size_of::<T>())?;
        let data =
            if self.allocated == 0 {
                unsafe { self.alloc.allocate_uninit::<T>(new_capacity) }
            }
            else {
                unsafe { self.alloc.reallocate_uninit(self.data, self.allocated, new_capacity) }
            };
        let data = data.ok_or(AllocFailed { new_capacity })?;
        self.data = data;
        self.capacity = new_capacity;
        self.allocated = new_capacity;
        Ok(())
    }

    /// Appends `value`, growing the buffer when full.
    ///
    /// On failure the array is unchanged, the error is returned and
    /// [`out_of_memory`](Self::out_of_memory) reads `true`.
    pub fn try_push(&mut self, value: T) -> Result<&mut T> {
        if self.len == self.capacity {
            if let Err(err) = self.grow() {
                self.oom = true;
                return Err(err)
            }
        }
        self.oom = false;
        unsafe {
            let mut ptr = self.data.add(self.len);
            ptr.write(value);
            self.len += 1;
            Ok(ptr.as_mut())
        }
    }

    /// Appends `value`, growing the buffer when full.
    ///
    /// Check [`out_of_memory`](Self::out_of_memory) afterwards to tell a
    /// dropped value from a stored one.
    #[inline(always)]
    pub fn push(&mut self, value: T) {
        let _ = self.try_push(value);
    }

    /// # Panics
    /// Panics if `index >= len`.
    #[inline(always)]
    pub fn at(&self, index: usize) -> T {
        if index >= self.len {
            panic!("index {} out of bounds for length {}", index, self.len)
        }
        unsafe { self.data.add(index).read() }
    }

    /// # Safety
    /// `index` must be less than [`len`](Self::len).
    #[inline(always)]
    pub unsafe fn at_unchecked(&self, index: usize) -> T {
        debug_assert!(index < self.len);
        unsafe { self.data.add(index).read() }
    }

    #[inline(always)]
    pub fn get(&self, index: usize) -> Option<T> {
        if index >= self.len {
            None
        }
        else {
            Some(unsafe { self.data.add(index).read() })
        }
    }

    /// # Panics
    /// Panics if `index >= len`.
    #[inline(always)]
    pub fn at_mut(&mut self, index: usize) -> &mut T {
        if index >= self.len {
            panic!("index {} out of bounds for length {}", index, self.len)
        }
        unsafe { self.data.add(index).as_mut() }
    }

    /// # Panics
    /// Panics if the array is empty.
    #[inline(always)]
    pub fn last(&self) -> T {
        if self.len == 0 {
            panic!("last called on an empty array")
        }
        unsafe { self.data.add(self.len - 1).read() }
    }

    /// # Panics
    /// Panics if the array is empty.
    #[inline(always)]
    pub fn last_mut(&mut self) -> &mut T {
        if self.len == 0 {
            panic!("last_mut called on an empty array")
        }
        unsafe { self.data.add(self.len - 1).as_mut() }
    }

    /// Removes the element at `index`, shifting the tail left by one.
    ///
    /// # Panics
    /// Panics if `index >= len`.
    pub fn remove(&mut self, index: usize) -> T {
        if index >= self.len {
            panic!("index {} was out of bounds with len {} when removing", index, self.len)
        }
        unsafe {
            let ptr = self.data.add(index);
            let removed = ptr.read();
            let count = self.len - index - 1;
            if count > 0 {
                ptr.add(1).copy_to(ptr, count);
            }
            self.len -= 1;
            removed
        }
    }

    #[inline(always)]
    pub fn try_remove(&mut self, index: usize) -> Result<T> {
        if index >= self.len {
            return Err(IndexOutOfBounds { index, len: self.len })
        }
        Ok(self.remove(index))
    }

    /// Removes the element at `index` by moving the last element into its
    /// slot. Does not keep order.
    ///
    /// # Panics
    /// Panics if `index >= len`.
    #[inline(always)]
    pub fn swap_remove(&mut self, index: usize) -> T {
        if index >= self.len {
            panic!("index {} was out of bounds with len {} when removing", index, self.len)
        }
        unsafe {
            let removed = self.data.add(index).read();
            self.len -= 1;
            if index != self.len {
                self.data.add(index).write(self.data.add(self.len).read())
            }
            removed
        }
    }

    #[inline(always)]
    pub fn try_swap_remove(&mut self, index: usize) -> Result<T> {
        if index >= self.len {
            return Err(IndexOutOfBounds { index, len: self.len })
        }
        Ok(self.swap_remove(index))
    }

    /// # Panics
    /// Panics if the array is empty.
    #[inline(always)]
    pub fn remove_last(&mut self) -> T {
        if self.len == 0 {
            panic!("remove_last called on an empty array")
        }
        self.len -= 1;
        unsafe { self.data.add(self.len).read() }
    }

    #[inline(always)]
    pub fn try_remove_last(&mut self) -> Option<T> {
        if self.len == 0 {
            return None
        }
        self.len -= 1;
        Some(unsafe { self.data.add(self.len).read() })
    }

    /// Sorts the elements in place with `cmp`. Equal elements may be
    /// reordered.
    #[inline(always)]
    pub fn sort_by<F>(&mut self, cmp: F)
        where
            F: FnMut(&T, &T) -> Ordering,
    {
        self.as_mut_slice().sort_unstable_by(cmp)
    }

    #[inline(always)]
    pub fn sort(&mut self)
        where
            T: Ord,
    {
        self.as_mut_slice().sort_unstable()
    }

    pub fn contains(&self, value: &T) -> bool
        where
            T: PartialEq,
    {
        self.as_slice().contains(value)
    }

    #[inline(always)]
    pub fn iter(&self) -> Iter<'_, T> {
        unsafe { Iter::new(self.data, self.len) }
    }

    #[inline(always)]
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        unsafe { IterMut::new(self.data, self.len) }
    }
}

impl<'alloc, T, Alloc, Policy> Drop for DynArray<'alloc, T, Alloc, Policy>
    where
        T: Copy,
        Alloc: Allocator,
        Policy: CapacityPolicy,
{

    #[inline(always)]
    fn drop(&mut self) {
        self.terminate()
    }
}

impl<'alloc, T, Alloc, Policy> Index<usize> for DynArray<'alloc, T, Alloc, Policy>
    where
        T: Copy,
        Alloc: Allocator,
        Policy: CapacityPolicy,
{

    type Output = T;

    #[inline(always)]
    fn index(&self, index: usize) -> &Self::Output {
        if index >= self.len {
            panic!("index {} out of bounds for length {}", index, self.len)
        }
        unsafe { self.data.add(index).as_ref() }
    }
}

impl<'alloc, T, Alloc, Policy> IndexMut<usize> for DynArray<'alloc, T, Alloc, Policy>
    where
        T: Copy,
        Alloc: Allocator,
        Policy: CapacityPolicy,
{

    #[inline(always)]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        self.at_mut(index)
    }
}

impl<'alloc, T, Alloc, Policy> AsRef<[T]> for DynArray<'alloc, T, Alloc, Policy>
    where
        T: Copy,
        Alloc: Allocator,
        Policy: CapacityPolicy,
{

    #[inline(always)]
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<'alloc, T, Alloc, Policy> AsMut<[T]> for DynArray<'alloc, T, Alloc, Policy>
    where
        T: Copy,
        Alloc: Allocator,
        Policy: CapacityPolicy,
{

    #[inline(always)]
    fn as_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<'vec, 'alloc, T, Alloc, Policy> IntoIterator for &'vec DynArray<'alloc, T, Alloc, Policy>
    where
        T: Copy,
        Alloc: Allocator,
        Policy: CapacityPolicy,
{

    type Item = &'vec T;
    type IntoIter = Iter<'vec, T>;

    #[inline(always)]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'vec, 'alloc, T, Alloc, Policy> IntoIterator for &'vec mut DynArray<'alloc, T, Alloc, Policy>
    where
        T: Copy,
        Alloc: Allocator,
        Policy: CapacityPolicy,
{

    type Item = &'vec mut T;
    type IntoIter = IterMut<'vec, T>;

    #[inline(always)]
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<'alloc, T, Alloc, Policy> Extend<T> for DynArray<'alloc, T, Alloc, Policy>
    where
        T: Copy,
        Alloc: Allocator,
        Policy: CapacityPolicy,
{

    /// Pushes every item, stopping at the first failed push.
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            if self.try_push(value).is_err() {
                return
            }
        }
    }
}

#[cfg(feature = "std")]
impl<T: Copy> FromIterator<T> for GlobalArray<T> {

    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut array = Self::new();
        array.extend(iter);
        array
    }
}

impl<'alloc, T, Alloc, Policy> fmt::Debug for DynArray<'alloc, T, Alloc, Policy>
    where
        T: Copy + fmt::Debug,
        Alloc: Allocator,
        Policy: CapacityPolicy,
{

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {

    use core::cell::Cell;

    use proptest::prelude::*;

    use super::*;
    use crate::capacity_policy::Bounded;

    /// Forwards to the process allocator, failing on request and counting
    /// the bytes it currently hands out.
    struct Flaky {
        fail: Cell<bool>,
        live: Cell<usize>,
    }

    impl Flaky {

        fn new() -> Self {
            Self {
                fail: Cell::new(false),
                live: Cell::new(0),
            }
        }
    }

    impl Allocator for Flaky {

        unsafe fn allocate_raw(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
            if self.fail.get() {
                return None
            }
            let ptr = unsafe { GLOBAL_ALLOC.allocate_raw(size, align)? };
            self.live.set(self.live.get() + size);
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
            if self.fail.get() {
                return None
            }
            let ptr = unsafe { GLOBAL_ALLOC.reallocate_raw(ptr, old_size, align, new_size)? };
            self.live.set(self.live.get() - old_size + new_size);
            Some(ptr)
        }

        unsafe fn free_raw(&self, ptr: NonNull<u8>, size: usize, align: usize) {
            self.live.set(self.live.get() - size);
            unsafe { GLOBAL_ALLOC.free_raw(ptr, size, align) }
        }
    }

    type FlakyArray<'a, T> = DynArray<'a, T, Flaky, Doubling>;

    fn filled(values: &[i32]) -> GlobalArray<i32> {
        let mut array = GlobalArray::new();
        for &value in values {
            array.push(value);
        }
        array
    }

    #[test]
    fn starts_empty_without_allocating() {
        let alloc = Flaky::new();
        let array = FlakyArray::<u64>::new_in(&alloc);
        assert_eq!(array.len(), 0);
        assert_eq!(array.capacity(), 0);
        assert!(!array.out_of_memory());
        assert_eq!(alloc.live.get(), 0);
    }

    #[test]
    fn first_push_allocates_eight() {
        let mut array = GlobalArray::new();
        array.push(7u8);
        assert_eq!(array.len(), 1);
        assert_eq!(array.capacity(), 8);
        assert_eq!(array.at(0), 7);
    }

    #[test]
    fn grows_only_when_full() {
        let mut array = GlobalArray::new();
        for i in 0..8 {
            array.push(i);
            assert_eq!(array.capacity(), 8);
        }
        array.push(8);
        assert_eq!(array.capacity(), 16);
        for i in 9..16 {
            array.push(i);
            assert_eq!(array.capacity(), 16);
        }
        array.push(16);
        assert_eq!(array.capacity(), 32);
    }

    #[test]
    fn failed_push_keeps_contents() {
        let alloc = Flaky::new();
        let mut array = FlakyArray::new_in(&alloc);
        for i in 0..8u32 {
            array.push(i);
        }
        let ptr = array.as_ptr();
        alloc.fail.set(true);
        assert_eq!(array.try_push(8), Err(AllocFailed { new_capacity: 16 }));
        assert!(array.out_of_memory());
        assert_eq!(array.len(), 8);
        assert_eq!(array.capacity(), 8);
        assert_eq!(array.as_ptr(), ptr);
        assert_eq!(array.as_slice(), &[0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn failed_first_push_stays_empty() {
        let alloc = Flaky::new();
        alloc.fail.set(true);
        let mut array = FlakyArray::<u16>::new_in(&alloc);
        array.push(1);
        assert!(array.out_of_memory());
        assert_eq!(array.len(), 0);
        assert_eq!(array.capacity(), 0);
    }

    #[test]
    fn out_of_memory_is_sticky_until_next_push() {
        let alloc = Flaky::new();
        let mut array = FlakyArray::new_in(&alloc);
        for i in 0..8u32 {
            array.push(i);
        }
        alloc.fail.set(true);
        array.push(8);
        assert!(array.out_of_memory());
        array.remove_last();
        array.sort();
        assert!(array.out_of_memory());
        // room left, no allocation needed
        array.push(100);
        assert!(!array.out_of_memory());
        assert_eq!(array.last(), 100);
    }

    #[test]
    fn out_of_memory_clears_after_successful_growth() {
        let alloc = Flaky::new();
        let mut array = FlakyArray::new_in(&alloc);
        for i in 0..8u32 {
            array.push(i);
        }
        alloc.fail.set(true);
        array.push(8);
        assert!(array.out_of_memory());
        alloc.fail.set(false);
        array.push(8);
        assert!(!array.out_of_memory());
        assert_eq!(array.len(), 9);
        assert_eq!(array.capacity(), 16);
    }

    #[test]
    fn bounded_policy_refuses_growth_past_half() {
        let mut array = DynArray::<u32, _, Bounded<256>>::new_in(&GLOBAL_ALLOC);
        for i in 0..64 {
            array.push(i);
            assert!(!array.out_of_memory());
        }
        assert_eq!(array.capacity(), 64);
        assert_eq!(array.try_push(64), Err(CapacityError::MaxCapacityExceeded { max_capacity: 64 }));
        assert!(array.out_of_memory());
        assert_eq!(array.len(), 64);
        assert_eq!(array.last(), 63);
    }

    #[test]
    fn zero_sized_elements_are_refused() {
        let mut array = GlobalArray::<()>::new();
        assert_eq!(array.try_push(()), Err(CapacityError::ZeroSizedElement));
        assert!(array.out_of_memory());
        assert!(array.is_empty());
    }

    #[test]
    fn ordered_remove_shifts_tail() {
        let mut array = filled(&[1, 2, 3, 4, 5]);
        assert_eq!(array.remove(1), 2);
        assert_eq!(array.as_slice(), &[1, 3, 4, 5]);
        assert_eq!(array.remove(3), 5);
        assert_eq!(array.as_slice(), &[1, 3, 4]);
        assert_eq!(array.capacity(), 8);
    }

    #[test]
    fn swap_remove_moves_last_into_slot() {
        let mut array = filled(&[10, 20, 30, 40, 50, 60]);
        assert_eq!(array.swap_remove(2), 30);
        assert_eq!(array.as_slice(), &[10, 20, 60, 40, 50]);
        assert_eq!(array.swap_remove(4), 50);
        assert_eq!(array.as_slice(), &[10, 20, 60, 40]);
    }

    #[test]
    fn remove_last_shrinks_by_one() {
        let mut array = filled(&[1, 2, 3]);
        assert_eq!(array.remove_last(), 3);
        assert_eq!(array.len(), 2);
        assert_eq!(array.capacity(), 8);
        assert_eq!(array.try_remove_last(), Some(2));
        assert_eq!(array.try_remove_last(), Some(1));
        assert_eq!(array.try_remove_last(), None);
    }

    #[test]
    fn last_mut_and_unchecked_access() {
        let mut array = filled(&[4, 5, 6]);
        *array.last_mut() += 10;
        assert_eq!(array.last(), 16);
        assert_eq!(unsafe { array.at_unchecked(0) }, 4);
        assert_eq!(unsafe { array.at_unchecked(2) }, 16);
        array.remove_last();
        assert_eq!(*array.last_mut(), 5);
    }

    #[test]
    #[should_panic(expected = "empty array")]
    fn last_mut_on_empty_panics() {
        let mut array = GlobalArray::<u8>::new();
        array.last_mut();
    }

    #[test]
    fn crosses_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GlobalArray<u64>>();

        let array = filled(&[1, 2, 3]);
        let sum = std::thread::spawn(move || array.iter().sum::<i32>())
            .join()
            .unwrap();
        assert_eq!(sum, 6);
    }

    #[test]
    fn checked_variants_report_out_of_bounds() {
        let mut array = filled(&[1, 2]);
        assert_eq!(array.get(2), None);
        assert_eq!(array.try_remove(2), Err(IndexOutOfBounds { index: 2, len: 2 }));
        assert_eq!(array.try_swap_remove(5), Err(IndexOutOfBounds { index: 5, len: 2 }));
        assert_eq!(array.len(), 2);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn at_past_len_panics() {
        let array = filled(&[1, 2, 3]);
        array.at(3);
    }

    #[test]
    #[should_panic(expected = "empty array")]
    fn remove_last_on_empty_panics() {
        let mut array = GlobalArray::<i32>::new();
        array.remove_last();
    }

    #[test]
    fn terminate_releases_and_is_idempotent() {
        let alloc = Flaky::new();
        let mut array = FlakyArray::new_in(&alloc);
        for i in 0..20u64 {
            array.push(i);
        }
        assert_eq!(alloc.live.get(), 32 * 8);
        array.terminate();
        assert_eq!(alloc.live.get(), 0);
        assert_eq!(array.len(), 0);
        assert_eq!(array.capacity(), 0);
        array.terminate();
        assert_eq!(alloc.live.get(), 0);
        assert_eq!(array.len(), 0);
        assert_eq!(array.capacity(), 0);
    }

    #[test]
    fn terminate_on_unused_array() {
        let mut array = GlobalArray::<u8>::new();
        array.terminate();
        array.terminate();
        assert!(array.is_empty());
    }

    #[test]
    fn terminated_array_is_reusable() {
        let mut array = filled(&[1, 2, 3]);
        array.terminate();
        array.push(9);
        assert_eq!(array.as_slice(), &[9]);
        assert_eq!(array.capacity(), 8);
    }

    #[test]
    fn drop_releases_buffer() {
        let alloc = Flaky::new();
        {
            let mut array = FlakyArray::new_in(&alloc);
            for i in 0..10u32 {
                array.push(i);
            }
            assert_ne!(alloc.live.get(), 0);
        }
        assert_eq!(alloc.live.get(), 0);
    }

    #[test]
    fn clear_resets_capacity_but_keeps_buffer() {
        let alloc = Flaky::new();
        let mut array = FlakyArray::new_in(&alloc);
        for i in 0..20u32 {
            array.push(i);
        }
        array.clear();
        assert_eq!(array.len(), 0);
        assert_eq!(array.capacity(), 0);
        assert!(!array.out_of_memory());
        // still held until reused or terminated
        assert_eq!(alloc.live.get(), 32 * 4);
        array.push(5);
        assert_eq!(array.capacity(), 8);
        assert_eq!(alloc.live.get(), 8 * 4);
        assert_eq!(array.as_slice(), &[5]);
        array.terminate();
        assert_eq!(alloc.live.get(), 0);
    }

    #[test]
    fn clear_resets_out_of_memory() {
        let alloc = Flaky::new();
        alloc.fail.set(true);
        let mut array = FlakyArray::<u8>::new_in(&alloc);
        array.push(1);
        assert!(array.out_of_memory());
        array.clear();
        assert!(!array.out_of_memory());
    }

    #[test]
    fn init_forgets_released_buffer() {
        let alloc = Flaky::new();
        let mut array = FlakyArray::new_in(&alloc);
        array.push(3u32);
        let (ptr, capacity) = (array.as_mut_ptr(), array.capacity());
        unsafe { alloc.free_uninit(NonNull::new(ptr).unwrap(), capacity) };
        array.init();
        assert_eq!(array.len(), 0);
        assert_eq!(array.capacity(), 0);
        assert_eq!(alloc.live.get(), 0);
        array.push(4);
        assert_eq!(array.as_slice(), &[4]);
    }

    #[test]
    fn sort_by_reverse_order() {
        let mut array = filled(&[3, 1, 4, 1, 5, 9, 2, 6]);
        array.sort_by(|a, b| b.cmp(a));
        assert_eq!(array.as_slice(), &[9, 6, 5, 4, 3, 2, 1, 1]);
        array.sort();
        assert_eq!(array.as_slice(), &[1, 1, 2, 3, 4, 5, 6, 9]);
    }

    #[test]
    fn iteration_is_restartable() {
        let array = filled(&[1, 2, 3, 4]);
        let iter = array.iter();
        assert_eq!(iter.len(), 4);
        let first: i32 = iter.clone().sum();
        let second: i32 = iter.sum();
        assert_eq!(first, 10);
        assert_eq!(second, 10);
        assert_eq!(array.iter().rev().copied().collect::<Vec<_>>(), vec![4, 3, 2, 1]);
        let mut count = 0;
        for _ in &array {
            count += 1;
        }
        assert_eq!(count, 4);
    }

    #[test]
    fn iter_mut_writes_through() {
        let mut array = filled(&[1, 2, 3]);
        for value in &mut array {
            *value *= 10;
        }
        array[0] += 1;
        assert_eq!(array.as_slice(), &[11, 20, 30]);
        let mut back = array.iter_mut();
        *back.next_back().unwrap() = 0;
        assert_eq!(array.as_slice(), &[11, 20, 0]);
    }

    #[test]
    fn holds_pointers_without_owning_them() {
        let names = ["a", "bb", "ccc"];
        let mut array = GlobalArray::<&str>::new();
        for name in names {
            array.push(name);
        }
        array.sort_by(|a, b| b.len().cmp(&a.len()));
        assert_eq!(array.as_slice(), &["ccc", "bb", "a"]);
    }

    #[test]
    fn end_to_end() {
        let mut array = GlobalArray::new();
        for i in 1..=10 {
            array.push(i);
        }
        assert_eq!(array.len(), 10);
        assert_eq!(array.capacity(), 16);
        array.remove(3);
        assert_eq!(array.as_slice(), &[1, 2, 3, 5, 6, 7, 8, 9, 10]);
        assert_eq!(array.len(), 9);
        array.swap_remove(0);
        assert_eq!(array.at(0), 10);
        assert_eq!(array.len(), 8);
        array.terminate();
        assert_eq!(array.len(), 0);
        assert_eq!(array.capacity(), 0);
    }

    #[test]
    fn collects_and_formats() {
        let array: GlobalArray<u8> = (1..=3).collect();
        assert_eq!(format!("{:?}", array), "[1, 2, 3]");
    }

    proptest! {
        #[test]
        fn pushes_are_readable_in_order(values in prop::collection::vec(any::<i64>(), 0..300)) {
            let mut array = GlobalArray::new();
            for &value in &values {
                array.push(value);
                prop_assert!(!array.out_of_memory());
            }
            prop_assert_eq!(array.len(), values.len());
            for (i, &value) in values.iter().enumerate() {
                prop_assert_eq!(array.at(i), value);
            }
        }

        #[test]
        fn capacity_follows_doubling(count in 1usize..2000) {
            let mut array = GlobalArray::new();
            for i in 0..count {
                let before = array.capacity();
                let full = array.len() == before;
                array.push(i as u32);
                if full {
                    let expected = if before == 0 { 8 } else { before * 2 };
                    prop_assert_eq!(array.capacity(), expected);
                }
                else {
                    prop_assert_eq!(array.capacity(), before);
                }
            }
            prop_assert_eq!(array.capacity(), count.next_power_of_two().max(8));
        }

        #[test]
        fn ordered_remove_keeps_order(
            values in prop::collection::vec(any::<i32>(), 1..100),
            pick in any::<prop::sample::Index>(),
        ) {
            let index = pick.index(values.len());
            let mut array = filled(&values);
            let removed = array.remove(index);
            let mut expected = values.clone();
            prop_assert_eq!(removed, expected.remove(index));
            prop_assert_eq!(array.as_slice(), expected.as_slice());
        }

        #[test]
        fn swap_remove_keeps_multiset(
            values in prop::collection::vec(any::<i32>(), 1..100),
            pick in any::<prop::sample::Index>(),
        ) {
            let index = pick.index(values.len());
            let mut array = filled(&values);
            let removed = array.swap_remove(index);
            prop_assert_eq!(removed, values[index]);
            if index != values.len() - 1 {
                prop_assert_eq!(array.at(index), values[values.len() - 1]);
            }
            let mut expected = values.clone();
            expected.swap_remove(index);
            let mut got = array.as_slice().to_vec();
            expected.sort();
            got.sort();
            prop_assert_eq!(got, expected);
        }

        #[test]
        fn sort_orders_adjacent_pairs(values in prop::collection::vec(any::<i16>(), 0..200)) {
            let mut array = GlobalArray::new();
            for &value in &values {
                array.push(value);
            }
            let cmp = |a: &i16, b: &i16| (a / 7).cmp(&(b / 7));
            array.sort_by(cmp);
            prop_assert_eq!(array.len(), values.len());
            for pair in array.as_slice().windows(2) {
                prop_assert_ne!(cmp(&pair[0], &pair[1]), Ordering::Greater);
            }
        }

        #[test]
        fn failed_push_is_all_or_nothing(count in 1usize..200) {
            let alloc = Flaky::new();
            let mut array = FlakyArray::new_in(&alloc);
            for i in 0..count {
                array.push(i as u64);
            }
            let snapshot = array.as_slice().to_vec();
            let capacity = array.capacity();
            alloc.fail.set(true);
            for i in 0..capacity - count + 1 {
                array.push(i as u64);
            }
            prop_assert!(array.out_of_memory());
            prop_assert_eq!(array.len(), capacity);
            prop_assert_eq!(array.capacity(), capacity);
            prop_assert_eq!(&array.as_slice()[..count], snapshot.as_slice());
        }
    }
}
