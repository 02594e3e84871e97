//! Tilekit runs 2D pixel-buffer operations on a persistent CPU thread pool.
//!
//! An operation describes its grid as a [`WorkItem`]: dimensions, bytes per cell, an optional
//! [`Restriction`] and a [`Kernel`] that processes one rectangular tile. The [`Scheduler`]
//! splits the grid into tiles of roughly `target_tile_bytes` and executes them on its pool
//! threads plus the calling thread, returning once every tile is done.
//!
//! - Build a [`Scheduler`] (or a [`Toolkit`] that owns one) from [`SchedulerOpts`]
//! - Call ready-made operations on [`Toolkit`], or run custom kernels with [`Scheduler::run`]
//! - Collect per-thread results with [`ThreadScratch`] indexed by [`Tile::thread_index`]
#![deny(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

mod exec;
mod foundation;
mod kernels;

pub mod imaging;
mod toolkit;

pub use crate::exec::scheduler::{
    DEFAULT_TARGET_TILE_BYTES, MAX_THREADS, PoolProbe, Scheduler, SchedulerOpts,
};
pub use crate::exec::scratch::ThreadScratch;
pub use crate::exec::shared::SharedOut;
pub use crate::exec::work_item::{Kernel, MIN_TILE_BYTES, Tile, Tiling, WorkItem};
pub use crate::foundation::error::{TilekitError, TilekitResult};
pub use crate::foundation::geometry::{
    Restriction, buffer_len, padded_size, validate_cell_size, validate_restriction,
};
pub use crate::foundation::simd::cpu_supports_simd;
pub use crate::kernels::blend::BlendMode;
pub use crate::kernels::blur::{MAX_BLUR_RADIUS, blur_sigma};
pub use crate::kernels::histogram::DEFAULT_DOT_COEFFICIENTS;
pub use crate::kernels::lut::LutTables;
pub use crate::toolkit::Toolkit;
