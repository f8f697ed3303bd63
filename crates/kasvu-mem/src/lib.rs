//! Allocator-backed dynamic arrays.
//!
//! [`DynArray`] is a contiguous, growable array of `Copy` values. Storage
//! comes from an injected [`Allocator`] and grows geometrically according
//! to a [`CapacityPolicy`]. Failed growth never panics: the array stays
//! untouched and raises a sticky flag readable through
//! [`DynArray::out_of_memory`].

#![cfg_attr(not(feature = "std"), no_std)]

#[macro_use]
mod macros;

pub mod capacity_policy;
pub mod array_types;
pub mod const_fn;

mod errors;
mod allocator;
#[cfg(feature = "std")]
mod global_alloc;

pub use errors::CapacityError;
pub use allocator::Allocator;
#[cfg(feature = "std")]
pub use global_alloc::{GlobalAlloc, GLOBAL_ALLOC};
pub use capacity_policy::{CapacityPolicy, Doubling, Bounded};
pub use array_types::{DynArray, Iter, IterMut};
#[cfg(feature = "std")]
pub use array_types::GlobalArray;
pub use const_fn::align_up;
