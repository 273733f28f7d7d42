//! Resource store seam and bundled implementations.
//!
//! This module contains:
//! - [`ResourceStore`] trait: the list/update/delete contract the view consumes
//! - [`MemoryResourceStore`]: in-process store behind a tokio `RwLock`
//! - [`FileResourceStore`]: one JSON file per deployment (feature `file-storage`)

mod memory;
mod store;

#[cfg(feature = "file-storage")]
pub mod file_backed;

pub use memory::MemoryResourceStore;
pub use store::ResourceStore;

#[cfg(feature = "file-storage")]
pub use file_backed::FileResourceStore;

#[cfg(test)]
mod tests;
