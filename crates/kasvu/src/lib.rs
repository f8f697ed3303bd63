//! Growable contiguous arrays over pluggable allocators.
//!
//! ```
//! use kasvu::mem::GlobalArray;
//!
//! let mut array = GlobalArray::new();
//! for i in 1..=10 {
//!     array.push(i);
//! }
//! assert!(!array.out_of_memory());
//! assert_eq!((array.len(), array.capacity()), (10, 16));
//! array.remove(3);
//! array.swap_remove(0);
//! assert_eq!(array.at(0), 10);
//! array.terminate();
//! assert_eq!(array.capacity(), 0);
//! ```

pub mod version;

pub use kasvu_mem as mem;
pub use kasvu_alloc as alloc;
pub use kasvu_log as log;

pub use version::{Version, VERSION};
pub use mem::{DynArray, GlobalArray, GlobalAlloc, GLOBAL_ALLOC, CapacityError};
