//! Allocators that plug into [`kasvu_mem::DynArray`].
//!
//! - [`ArenaAlloc`]: fixed-size bump arena, fails once exhausted.
//! - [`LimitAlloc`]: byte budget and failure injection over another allocator.
//! - [`LogAlloc`]: traces every request through `kasvu-log`.

mod arena_alloc;
mod limit_alloc;
mod log_alloc;

pub use arena_alloc::{ArenaAlloc, ArenaGuard};
pub use limit_alloc::LimitAlloc;
pub use log_alloc::LogAlloc;
