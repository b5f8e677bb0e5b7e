// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Batching and deduplication of render/impression events.
//!
//! - [`PayloadPool`]: requests pending in the current window
//! - [`Debouncer`]: the sliding window timer
//! - [`partition_and_merge`]: collapses the drained pool by [`BatchKey`]

pub mod debounce;
pub mod merge;
pub mod pool;

pub use debounce::Debouncer;
pub use merge::{partition_and_merge, BatchKey};
pub use pool::PayloadPool;
