//! Archive content store used by the ramdisk patch pipelines.
//!
//! The patch steps never see a cpio stream. They work against the [`Archive`] port, which maps
//! entry names to byte contents. [`MemoryArchive`] is the in-process implementation; [`load_dir`]
//! and [`persist_changes`] move an extracted ramdisk tree in and out of it.

mod dir;
mod memory;
mod ports;

pub use dir::{ArchiveIoError, load_dir, persist_changes};
pub use memory::MemoryArchive;
pub use ports::Archive;
