//! Frame allocation with FIFO eviction to the backing store.
//!
//! The allocator owns physical memory, the free frame list and the backing store.
//! It hands frames to the page table: from the free list while it lasts, then by
//! evicting the oldest resident page and saving its content under its own page
//! number.

use alloc::collections::VecDeque;

use crate::config::BackingStoreConfig;
use crate::page_table::{FaultKind, FrameGrant, FrameSource, PageTable};
use crate::{BackingStore, FrameNumber, PageNumber, PhysicalMemory, VmError};

/// Owns every physical frame while it is not mapped by the page table.
pub struct FrameAllocator {
    memory: PhysicalMemory,
    free: VecDeque<FrameNumber>,
    store: BackingStore,
}

impl FrameAllocator {
    /// Creates an allocator with every frame of `memory` free, handed out in
    /// ascending frame order.
    pub fn new(memory: PhysicalMemory, config: BackingStoreConfig) -> Self {
        let free = (0..memory.frame_count()).map(FrameNumber::new).collect();
        Self {
            memory,
            free,
            store: BackingStore::new(config),
        }
    }

    /// Returns the number of frames in the free list.
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Returns the physical memory.
    pub fn memory(&self) -> &PhysicalMemory {
        &self.memory
    }

    /// Returns the physical memory, mutably.
    pub fn memory_mut(&mut self) -> &mut PhysicalMemory {
        &mut self.memory
    }

    /// Returns the backing store.
    pub fn store(&self) -> &BackingStore {
        &self.store
    }

    fn take_frame(&mut self, table: &mut PageTable) -> Result<(FrameNumber, Option<PageNumber>), VmError> {
        if let Some(frame) = self.free.pop_front() {
            return Ok((frame, None));
        }

        let (victim, frame) = table.evict()?;
        self.store.write(victim, self.memory.frame(frame)?);
        Ok((frame, Some(victim)))
    }

    fn prepare(&mut self, frame: FrameNumber, page: PageNumber, kind: FaultKind) -> Result<(), VmError> {
        match kind {
            // A fresh page never inherits bytes, even if its page number has a record.
            FaultKind::FirstTouch => self.memory.zero(frame),
            FaultKind::SwapIn => {
                let data = self.memory.frame_mut(frame)?;
                if self.store.read(page, data) {
                    Ok(())
                } else {
                    Err(VmError::MissingSwapRecord(page))
                }
            }
        }
    }
}

impl FrameSource for FrameAllocator {
    fn acquire_frame(
        &mut self,
        table: &mut PageTable,
        page: PageNumber,
        kind: FaultKind,
    ) -> Result<FrameGrant, VmError> {
        let (frame, evicted) = self.take_frame(table)?;

        if let Err(err) = self.prepare(frame, page, kind) {
            // The frame is not mapped anywhere now; keep it accounted for.
            self.free.push_front(frame);
            return Err(err);
        }

        Ok(FrameGrant { frame, evicted })
    }
}
