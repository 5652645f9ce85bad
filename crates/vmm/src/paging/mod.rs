//! Paging structures.
//!
//! The page table is two levels deep: a top-level [`crate::PageTable`] holds up to
//! 1024 [`PageDirectory`] values, each holding up to 1024 [`PageEntry`] values.
//! Both levels are populated lazily and share the [`PageFlags`] value type.

mod directory;
mod entry;
mod flags;

pub use directory::PageDirectory;
pub use entry::PageEntry;
pub use flags::PageFlags;
