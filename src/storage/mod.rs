//! Persistence backends and the dual-backend facade.
//!
//! - [`traits`]: host capabilities (`CookieStore`, `LocalStore`)
//! - [`cookie`]: cookie record and attribute policy
//! - [`memory`]: in-memory backends
//! - [`facade`]: [`facade::PersistentStore`], the read/write contract the
//!   rest of the crate uses

pub mod cookie;
pub mod facade;
pub mod memory;
pub mod traits;
