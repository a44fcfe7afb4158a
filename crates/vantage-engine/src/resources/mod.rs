//! Reference-counted resource tables.
//!
//! The tables only track what exists and who holds it; devices create and
//! destroy the GPU objects. [`Renderer`](crate::render::Renderer) pairs each
//! table with its device so a request can never construct a shared resource
//! without going through the cache.

mod stats;
mod table;

pub use stats::{ResourceKind, ResourceStats};
pub use table::{OwnedTable, Release, SharedTable};
