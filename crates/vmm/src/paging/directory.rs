//! Second-level page directory.

use alloc::boxed::Box;

use crate::layout::ENTRIES_PER_DIRECTORY;

use super::entry::PageEntry;
use super::flags::PageFlags;

/// A page directory: 1024 lazily created page table entries.
///
/// Each slot is indexed by the table index (bits 12-21) of a virtual address.
/// The directory's own present flag records that a lookup has touched it; it is
/// bookkeeping only and plays no part in translation.
pub struct PageDirectory {
    flags: PageFlags,
    entries: Box<[Option<PageEntry>; ENTRIES_PER_DIRECTORY]>,
}

impl PageDirectory {
    /// Creates a new, empty directory.
    ///
    /// All slots are empty and the directory is not yet present.
    pub fn new() -> Self {
        Self {
            flags: PageFlags::empty(),
            entries: Box::new([None; ENTRIES_PER_DIRECTORY]),
        }
    }

    /// Returns the entry at the given index, if one has been created.
    ///
    /// # Panics
    /// Panics if index >= 1024.
    pub fn entry(&self, index: usize) -> Option<&PageEntry> {
        assert!(index < ENTRIES_PER_DIRECTORY, "table index out of bounds");
        self.entries[index].as_ref()
    }

    /// Returns a mutable reference to the entry at the given index, if one has been created.
    ///
    /// # Panics
    /// Panics if index >= 1024.
    pub fn entry_mut(&mut self, index: usize) -> Option<&mut PageEntry> {
        assert!(index < ENTRIES_PER_DIRECTORY, "table index out of bounds");
        self.entries[index].as_mut()
    }

    /// Stores `entry` at the given index, replacing whatever was there.
    ///
    /// # Panics
    /// Panics if index >= 1024.
    pub fn insert(&mut self, index: usize, entry: PageEntry) -> &mut PageEntry {
        assert!(index < ENTRIES_PER_DIRECTORY, "table index out of bounds");
        self.entries[index].insert(entry)
    }

    /// Returns the number of entries that have been created.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// Returns true if no entry has been created.
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|e| e.is_none())
    }

    /// Returns whether the directory has been touched by a lookup.
    pub fn is_present(&self) -> bool {
        self.flags.is_present()
    }

    /// Marks the directory as touched.
    pub fn set_present(&mut self, present: bool) {
        self.flags.set_present(present);
    }
}

impl Default for PageDirectory {
    fn default() -> Self {
        Self::new()
    }
}
