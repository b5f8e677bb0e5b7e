// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Cart and recently-viewed state.
//!
//! Each operation replaces the persisted list wholesale and reports whether
//! the content actually changed; callers schedule a preflight only then.

pub mod cart;
pub mod viewed;

pub use cart::{CartStore, CART_KEY};
pub use viewed::{ViewedStore, MAX_VIEWED_COUNT, VIEWED_KEY};
