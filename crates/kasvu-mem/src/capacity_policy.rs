//! Growth policies for [`DynArray`](crate::DynArray).

use crate::errors::CapacityError::{self, MaxCapacityExceeded, ZeroSizedElement};

/// Decides how much capacity an array grows to when it runs full.
pub trait CapacityPolicy {

    /// Capacity of the first allocation.
    fn initial() -> usize;

    /// Largest buffer, in bytes, the policy ever asks for.
    fn max_bytes() -> usize;

    /// Largest element count for elements of `elem_size` bytes.
    ///
    /// Divides instead of multiplying so that no byte count is ever
    /// computed for a capacity that does not fit.
    #[inline(always)]
    fn max_elements(elem_size: usize) -> usize {
        Self::max_bytes() / elem_size
    }

    /// Capacity to grow to from a full array of `current` slots.
    fn grow(current: usize, elem_size: usize) -> Result<usize, CapacityError> {
        if elem_size == 0 {
            return Err(ZeroSizedElement)
        }
        let max = Self::max_elements(elem_size);
        if current > max / 2 {
            return Err(MaxCapacityExceeded { max_capacity: max })
        }
        let new_capacity =
            if current == 0 {
                Self::initial()
            }
            else {
                current * 2
            };
        if new_capacity > max {
            return Err(MaxCapacityExceeded { max_capacity: max })
        }
        Ok(new_capacity)
    }
}

/// Starts at 8 slots and doubles, up to the largest layout Rust can describe.
pub struct Doubling {}

impl CapacityPolicy for Doubling {

    #[inline(always)]
    fn initial() -> usize {
        8
    }

    #[inline(always)]
    fn max_bytes() -> usize {
        isize::MAX as usize
    }
}

/// [`Doubling`] growth with a ceiling of `MAX_BYTES` bytes per buffer.
pub struct Bounded<const MAX_BYTES: usize> {}

impl<const MAX_BYTES: usize> CapacityPolicy for Bounded<MAX_BYTES> {

    #[inline(always)]
    fn initial() -> usize {
        Doubling::initial()
    }

    #[inline(always)]
    fn max_bytes() -> usize {
        MAX_BYTES.min(Doubling::max_bytes())
    }
}
