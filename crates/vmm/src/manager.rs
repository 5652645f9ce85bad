//! The virtual memory manager.
//!
//! [`Mmu`] ties the page table, the frame allocator and the bump allocator
//! together and records every translation in a trace. [`VirtualMemory`] wraps it
//! in a `RefCell` so that typed pointers can share it.

use core::cell::{Ref, RefCell, RefMut};
use core::mem::size_of;

use crate::layout::VIRTUAL_MEMORY_SIZE;
use crate::page_table::{FaultKind, PageTable, Walk};
use crate::pointer::{Element, VirtualPointer};
use crate::trace::{MemoryTrace, TraceRecord, TraceSink};
use crate::{FrameAllocator, PhysicalAddress, PhysicalMemory, VirtualAddress, VmConfig, VmError};

/// A snapshot of manager activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    /// Translations performed, hits included.
    pub translations: u64,
    /// Translations that faulted.
    pub faults: u64,
    /// Faults on pages that had never been touched.
    pub first_touches: u64,
    /// Faults on pages reloaded from the backing store.
    pub swap_ins: u64,
    /// Pages written out to make room.
    pub evictions: u64,
    /// Page directories created.
    pub directories: usize,
    /// Pages currently mapped to a frame.
    pub resident_pages: usize,
    /// Frames never handed out.
    pub free_frames: usize,
    /// Distinct pages with a backing store record.
    pub swapped_pages: usize,
}

#[derive(Debug, Default)]
struct Counters {
    translations: u64,
    faults: u64,
    first_touches: u64,
    swap_ins: u64,
    evictions: u64,
}

impl Counters {
    fn count(&mut self, walk: &Walk) {
        self.translations += 1;
        match walk.fault {
            Some(FaultKind::FirstTouch) => self.first_touches += 1,
            Some(FaultKind::SwapIn) => self.swap_ins += 1,
            None => return,
        }
        self.faults += 1;
        if walk.evicted.is_some() {
            self.evictions += 1;
        }
    }
}

/// The manager state behind a [`VirtualMemory`].
pub(crate) struct Mmu<S> {
    table: PageTable,
    frames: FrameAllocator,
    allocated: u64,
    counters: Counters,
    trace: S,
}

impl<S: TraceSink> Mmu<S> {
    pub(crate) fn new(config: VmConfig, trace: S) -> Self {
        Self {
            table: PageTable::new(),
            frames: FrameAllocator::new(PhysicalMemory::new(), config.backing_store),
            allocated: 0,
            counters: Counters::default(),
            trace,
        }
    }

    /// Translates `address` to its location in physical memory, faulting the
    /// page in if needed, and records the access.
    pub(crate) fn translate(&mut self, address: VirtualAddress) -> Result<PhysicalAddress, VmError> {
        let walk = self
            .table
            .translate(address, &mut self.frames)
            .inspect_err(|err| {
                if err.is_invariant_violation() {
                    log::error!("translation of {} failed: {}", address, err);
                }
            })?;

        let physical = PhysicalAddress::in_frame(walk.frame, address.page_offset());
        self.counters.count(&walk);

        match walk.fault {
            Some(kind) => log::debug!(
                "{:?} fault at {} -> frame {} (evicted {:?})",
                kind,
                address,
                walk.frame,
                walk.evicted
            ),
            None => log::trace!("{} -> {}", address, physical),
        }

        self.trace.record(&TraceRecord {
            page_number: address.page_number(),
            virtual_address: address,
            physical_address: physical,
            page_fault: walk.fault.is_some(),
            was_swapped: walk.evicted.is_some(),
            evicted_page: walk.evicted,
            directory_allocated: walk.directory_allocated,
        })?;

        Ok(physical)
    }

    /// Reserves `size` bytes aligned to `align` from the bump allocator.
    ///
    /// On failure the allocator is left untouched.
    pub(crate) fn reserve(&mut self, size: u64, align: u64) -> Result<VirtualAddress, VmError> {
        let available = VIRTUAL_MEMORY_SIZE - self.allocated;
        let exhausted = |requested| VmError::OutOfVirtualMemory {
            requested,
            available,
        };

        let start = self.allocated.next_multiple_of(align);
        let end = start
            .checked_add(size)
            .ok_or_else(|| exhausted(u64::MAX))?;
        if start >= VIRTUAL_MEMORY_SIZE || end > VIRTUAL_MEMORY_SIZE {
            return Err(exhausted(end - self.allocated));
        }

        self.allocated = end;
        // `start` is below 2^32.
        Ok(VirtualAddress::new(start as u32))
    }

    pub(crate) fn allocated(&self) -> u64 {
        self.allocated
    }

    pub(crate) fn memory_mut(&mut self) -> &mut PhysicalMemory {
        self.frames.memory_mut()
    }

    pub(crate) fn stats(&self) -> MemoryStats {
        MemoryStats {
            translations: self.counters.translations,
            faults: self.counters.faults,
            first_touches: self.counters.first_touches,
            swap_ins: self.counters.swap_ins,
            evictions: self.counters.evictions,
            directories: self.table.directory_count(),
            resident_pages: self.table.resident_count(),
            free_frames: self.frames.free_count(),
            swapped_pages: self.frames.store().len(),
        }
    }

    pub(crate) fn trace(&self) -> &S {
        &self.trace
    }

    pub(crate) fn trace_mut(&mut self) -> &mut S {
        &mut self.trace
    }

    #[cfg(test)]
    pub(crate) fn table(&self) -> &PageTable {
        &self.table
    }
}

/// An emulated 4GiB address space backed by 64 frames of physical memory.
///
/// Memory is handed out by [`VirtualMemory::allocate`] as typed pointers. Every
/// dereference goes through the page table, so touching more pages than there
/// are frames evicts the oldest resident page to the backing store.
///
/// The manager is single-threaded. An [`crate::ElementMut`] guard borrows it
/// exclusively; any other operation while a guard is alive fails with
/// [`VmError::Busy`].
///
/// # Examples
///
/// ```
/// use vmm::VirtualMemory;
///
/// let vm = VirtualMemory::new();
/// let numbers = vm.allocate::<i32>(4).unwrap();
/// numbers.element(2).write(7).unwrap();
/// assert_eq!(numbers.element(2).read().unwrap(), 7);
/// ```
pub struct VirtualMemory<S: TraceSink = MemoryTrace> {
    pub(crate) mmu: RefCell<Mmu<S>>,
}

impl VirtualMemory {
    /// Creates a manager with the default configuration, tracing into memory.
    pub fn new() -> Self {
        Self::with_trace(VmConfig::default(), MemoryTrace::new())
    }

    /// Creates a manager with `config`, tracing into memory.
    pub fn with_config(config: VmConfig) -> Self {
        Self::with_trace(config, MemoryTrace::new())
    }
}

impl Default for VirtualMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TraceSink> VirtualMemory<S> {
    /// Creates a manager with `config` that records every translation in `trace`.
    pub fn with_trace(config: VmConfig, trace: S) -> Self {
        Self {
            mmu: RefCell::new(Mmu::new(config, trace)),
        }
    }

    /// Allocates room for `count` elements of `T` and returns a pointer to the
    /// first one.
    ///
    /// The returned address is the allocation cursor rounded up to the size of
    /// `T`, and it must lie below 2^32: once the whole address space is handed
    /// out, even a zero-length allocation fails. Nothing is mapped until the
    /// memory is dereferenced.
    pub fn allocate<T: Element>(&self, count: usize) -> Result<VirtualPointer<'_, T, S>, VmError> {
        let size = (count as u64)
            .checked_mul(size_of::<T>() as u64)
            .unwrap_or(u64::MAX);
        let address = self.borrow_mut()?.reserve(size, T::ALIGN as u64)?;
        log::trace!("allocated {} x {} bytes at {}", count, size_of::<T>(), address);
        Ok(VirtualPointer::new(self, address))
    }

    /// Translates `address`, faulting its page in if needed.
    pub fn translate(&self, address: VirtualAddress) -> Result<PhysicalAddress, VmError> {
        self.borrow_mut()?.translate(address)
    }

    /// Returns the number of bytes handed out by the bump allocator.
    pub fn allocated_bytes(&self) -> Result<u64, VmError> {
        Ok(self.borrow()?.allocated())
    }

    /// Returns a snapshot of manager activity.
    pub fn stats(&self) -> Result<MemoryStats, VmError> {
        Ok(self.borrow()?.stats())
    }

    /// Runs `f` with the trace sink.
    pub fn inspect_trace<R>(&self, f: impl FnOnce(&S) -> R) -> Result<R, VmError> {
        Ok(f(self.borrow()?.trace()))
    }

    /// Flushes the trace sink.
    pub fn flush_trace(&self) -> Result<(), VmError> {
        self.borrow_mut()?.trace_mut().flush()?;
        Ok(())
    }

    /// Consumes the manager and returns its trace sink.
    pub fn into_trace(self) -> S {
        self.mmu.into_inner().trace
    }

    fn borrow(&self) -> Result<Ref<'_, Mmu<S>>, VmError> {
        self.mmu.try_borrow().map_err(|_| VmError::Busy)
    }

    pub(crate) fn borrow_mut(&self) -> Result<RefMut<'_, Mmu<S>>, VmError> {
        self.mmu.try_borrow_mut().map_err(|_| VmError::Busy)
    }
}
