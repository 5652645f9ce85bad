//! Top-level page table.
//!
//! This module provides the `PageTable` type, which owns the page directories and
//! the global resident queue, and implements the address walk with demand paging.

use alloc::boxed::Box;
use alloc::collections::VecDeque;

use crate::layout::DIRECTORY_COUNT;
use crate::paging::{PageDirectory, PageEntry};
use crate::{FrameNumber, PageNumber, VirtualAddress, VmError};

/// The kind of page fault being serviced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// The page has never been touched. Its frame must be zero-filled.
    FirstTouch,
    /// The page was evicted. Its frame must be reloaded from the backing store.
    SwapIn,
}

/// A frame handed to the page table to service a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGrant {
    /// The frame now holding the faulting page's content.
    pub frame: FrameNumber,
    /// The page evicted to free the frame, if the free pool was empty.
    pub evicted: Option<PageNumber>,
}

/// Supplies frames to the page table when a walk faults.
///
/// The source receives the page table itself so that it can evict the oldest
/// resident page when it has no free frame left.
pub trait FrameSource {
    /// Returns a frame prepared for `page`: zero-filled for a first touch, or
    /// reloaded from the backing store for a swap-in.
    fn acquire_frame(
        &mut self,
        table: &mut PageTable,
        page: PageNumber,
        kind: FaultKind,
    ) -> Result<FrameGrant, VmError>;
}

/// The outcome of a page table walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Walk {
    /// The frame mapping the walked address.
    pub frame: FrameNumber,
    /// The fault serviced by this walk, if any.
    pub fault: Option<FaultKind>,
    /// Whether the walk created the page directory.
    pub directory_allocated: bool,
    /// The page evicted while servicing the fault, if any.
    pub evicted: Option<PageNumber>,
}

/// A two-level page table with a global FIFO of resident pages.
///
/// Directories are created on first reference and live as long as the table.
/// Every present entry has exactly one record in the resident queue, in the order
/// its page was faulted in; eviction always takes the oldest record.
pub struct PageTable {
    directories: Box<[Option<PageDirectory>]>,
    resident: VecDeque<(PageNumber, FrameNumber)>,
    directory_count: usize,
}

impl PageTable {
    /// Creates a new page table with no directories.
    pub fn new() -> Self {
        Self {
            directories: (0..DIRECTORY_COUNT).map(|_| None).collect(),
            resident: VecDeque::new(),
            directory_count: 0,
        }
    }

    /// Walks the table for `address`, servicing a page fault if needed.
    ///
    /// Missing directories are created. A missing entry is a first touch; a
    /// non-present entry is a swap-in. In both cases `source` provides the frame
    /// and the page is queued as the newest resident page.
    pub fn translate<S: FrameSource + ?Sized>(
        &mut self,
        address: VirtualAddress,
        source: &mut S,
    ) -> Result<Walk, VmError> {
        let page = address.page_number();
        let directory_index = address.directory_index();
        let table_index = address.table_index();

        let directory_allocated = self.directories[directory_index].is_none();
        if directory_allocated {
            log::debug!("allocating page directory {}", directory_index);
            self.directory_count += 1;
        }
        let directory = self.directories[directory_index].get_or_insert_with(PageDirectory::new);
        directory.set_present(true);

        let kind = match directory.entry(table_index) {
            Some(entry) if entry.is_present() => {
                return Ok(Walk {
                    frame: entry.frame(),
                    fault: None,
                    directory_allocated,
                    evicted: None,
                });
            }
            Some(_) => FaultKind::SwapIn,
            None => FaultKind::FirstTouch,
        };

        let grant = source.acquire_frame(self, page, kind)?;

        // Eviction only invalidates entries; the directory is still here.
        let directory = self.directories[directory_index]
            .as_mut()
            .ok_or_else(|| VmError::inconsistent(Some(page), "directory vanished during fault"))?;

        match kind {
            FaultKind::FirstTouch => {
                directory.insert(table_index, PageEntry::new(page, grant.frame));
            }
            FaultKind::SwapIn => {
                let entry = directory
                    .entry_mut(table_index)
                    .ok_or_else(|| VmError::inconsistent(Some(page), "entry vanished during fault"))?;
                entry.swap_in(grant.frame);
            }
        }
        self.resident.push_back((page, grant.frame));

        Ok(Walk {
            frame: grant.frame,
            fault: Some(kind),
            directory_allocated,
            evicted: grant.evicted,
        })
    }

    /// Evicts the oldest resident page.
    ///
    /// The page's entry is marked swapped out but keeps its frame number; the
    /// caller is responsible for saving the frame's content and reusing it.
    pub fn evict(&mut self) -> Result<(PageNumber, FrameNumber), VmError> {
        let (page, frame) = self
            .resident
            .pop_front()
            .ok_or_else(|| VmError::inconsistent(None, "no resident page to evict"))?;

        let address = page.start();
        let entry = self.directories[address.directory_index()]
            .as_mut()
            .ok_or_else(|| VmError::inconsistent(Some(page), "resident page has no directory"))?
            .entry_mut(address.table_index())
            .ok_or_else(|| VmError::inconsistent(Some(page), "resident page has no entry"))?;

        if !entry.is_present() || entry.frame() != frame {
            return Err(VmError::inconsistent(
                Some(page),
                "resident queue disagrees with page entry",
            ));
        }
        entry.swap_out();

        log::debug!("evicted page {} from frame {}", page, frame);
        Ok((page, frame))
    }

    /// Returns the entry for `address` without creating anything.
    pub fn entry(&self, address: VirtualAddress) -> Option<&PageEntry> {
        self.directories[address.directory_index()]
            .as_ref()?
            .entry(address.table_index())
    }

    /// Returns the directory at `index`, if it has been created.
    pub fn directory(&self, index: usize) -> Option<&PageDirectory> {
        self.directories.get(index)?.as_ref()
    }

    /// Returns the number of directories created so far.
    pub fn directory_count(&self) -> usize {
        self.directory_count
    }

    /// Returns the number of resident pages.
    pub fn resident_count(&self) -> usize {
        self.resident.len()
    }

    /// Returns the resident pages, oldest first.
    pub fn resident(&self) -> impl Iterator<Item = (PageNumber, FrameNumber)> + '_ {
        self.resident.iter().copied()
    }
}

impl Default for PageTable {
    fn default() -> Self {
        Self::new()
    }
}
