use core::{
    iter::FusedIterator,
    marker::PhantomData,
    ptr::NonNull,
};

/// Forward iterator over the elements of a [`DynArray`](crate::DynArray).
pub struct Iter<'a, T> {
    ptr: NonNull<T>,
    len: usize,
    _marker: PhantomData<&'a T>,
}

/// Mutable iterator over the elements of a [`DynArray`](crate::DynArray).
pub struct IterMut<'a, T> {
    ptr: NonNull<T>,
    len: usize,
    _marker: PhantomData<&'a mut T>,
}

impl<'a, T> Iter<'a, T> {

    /// # Safety
    /// `ptr` must point to `len` initialized values that outlive `'a`.
    #[inline(always)]
    pub(crate) unsafe fn new(ptr: NonNull<T>, len: usize) -> Self {
        Self {
            ptr,
            len,
            _marker: PhantomData,
        }
    }
}

impl<'a, T> IterMut<'a, T> {

    /// # Safety
    /// `ptr` must point to `len` initialized values, exclusively borrowed
    /// for `'a`.
    #[inline(always)]
    pub(crate) unsafe fn new(ptr: NonNull<T>, len: usize) -> Self {
        Self {
            ptr,
            len,
            _marker: PhantomData,
        }
    }
}

impl<'a, T> Clone for Iter<'a, T> {

    fn clone(&self) -> Self {
        Self {
            ptr: self.ptr,
            len: self.len,
            _marker: PhantomData,
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {

    type Item = &'a T;

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            None
        }
        else {
            let item = unsafe { self.ptr.as_ref() };
            self.ptr = unsafe { self.ptr.add(1) };
            self.len -= 1;
            Some(item)
        }
    }

    #[inline(always)]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {

    #[inline(always)]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            None
        }
        else {
            self.len -= 1;
            Some(unsafe { self.ptr.add(self.len).as_ref() })
        }
    }
}

impl<'a, T> ExactSizeIterator for Iter<'a, T> {}

impl<'a, T> FusedIterator for Iter<'a, T> {}

impl<'a, T> Iterator for IterMut<'a, T> {

    type Item = &'a mut T;

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            None
        }
        else {
            let item = unsafe { self.ptr.as_mut() };
            self.ptr = unsafe { self.ptr.add(1) };
            self.len -= 1;
            Some(item)
        }
    }

    #[inline(always)]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'a, T> DoubleEndedIterator for IterMut<'a, T> {

    #[inline(always)]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            None
        }
        else {
            self.len -= 1;
            Some(unsafe { self.ptr.add(self.len).as_mut() })
        }
    }
}

impl<'a, T> ExactSizeIterator for IterMut<'a, T> {}

impl<'a, T> FusedIterator for IterMut<'a, T> {}
