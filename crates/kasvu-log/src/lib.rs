//! Colored stderr logging for the kasvu crates.
//!
//! Call [`init`] once; until then every log macro is a no-op. Levels are
//! taken from `RUST_LOG` (`info`, `kasvu_alloc=trace,warn`, ...).

#[macro_use]
mod log;

pub use log::*;

pub type Result<T> = core::result::Result<T, LogError>;
