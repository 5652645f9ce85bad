//! # Virtual Memory Manager (VMM)
//!
//! An emulator for a demand-paged 32-bit virtual memory system. It provides:
//!
//! - A 4GiB virtual address space handed out by a bump allocator as typed pointers.
//! - A two-level page table (10/10/12 bit split) populated on first touch.
//! - 64 frames of emulated physical memory, allocated lazily.
//! - FIFO eviction of resident pages to an unbounded in-memory backing store.
//! - A per-access trace, in memory or as CSV.
//!
//! ```
//! use vmm::VirtualMemory;
//!
//! let vm = VirtualMemory::new();
//! let mut cursor = vm.allocate::<i32>(1024 * 65).unwrap();
//! for page in 0..65 {
//!     cursor.write(page).unwrap();
//!     cursor.step(1024);
//! }
//!
//! let stats = vm.stats().unwrap();
//! assert_eq!(stats.faults, 65);
//! assert_eq!(stats.evictions, 1);
//! ```

extern crate alloc;

mod address;
mod backing_store;
mod config;
mod error;
mod frame_allocator;
mod human_size;
pub mod layout;
mod manager;
mod numbers;
mod page_table;
mod paging;
mod physical_memory;
mod pointer;
mod trace;

pub use address::{PhysicalAddress, VirtualAddress};
pub use backing_store::BackingStore;
pub use config::{BackingStoreConfig, DEFAULT_PRESSURE_THRESHOLD, PressureAction, VmConfig};
pub use error::VmError;
pub use frame_allocator::FrameAllocator;
pub use human_size::HumanSize;
pub use manager::{MemoryStats, VirtualMemory};
pub use numbers::{FrameNumber, PageNumber};
pub use page_table::{FaultKind, FrameGrant, FrameSource, PageTable, Walk};
pub use paging::{PageDirectory, PageEntry, PageFlags};
pub use physical_memory::{FrameData, PhysicalMemory};
pub use pointer::{Element, ElementMut, VirtualPointer};
pub use trace::{CSV_HEADER, CsvTrace, MemoryTrace, NullTrace, TraceRecord, TraceSink};
