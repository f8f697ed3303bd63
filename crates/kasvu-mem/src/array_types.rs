mod dyn_array;
mod iter;

pub use dyn_array::DynArray;
#[cfg(feature = "std")]
pub use dyn_array::GlobalArray;
pub use iter::{Iter, IterMut};

pub type Result<T> = core::result::Result<T, crate::CapacityError>;
