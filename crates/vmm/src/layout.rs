//! Fixed geometry of the emulated machine.
//!
//! The emulated machine is a 32-bit, two-level paged system:
//! - 32-bit virtual addresses (4GiB addressable)
//! - 2 levels of translation (directory, then table)
//! - 10-bit indexes (1024 entries at each level)
//! - 12-bit page offset (4KiB pages)
//! - 64 physical frames (256KiB of physical memory)
//!
//! Address layout:
//! - Bits 0-11: Page offset
//! - Bits 12-21: Table index (selects an entry inside a directory)
//! - Bits 22-31: Directory index (selects a directory inside the page table)

/// Number of bits in the page offset.
pub const OFFSET_BITS: u32 = 12;

/// Number of bits in the table index.
pub const TABLE_BITS: u32 = 10;

/// Number of bits in the directory index.
pub const DIRECTORY_BITS: u32 = 10;

/// Width of a virtual address in bits.
pub const VIRTUAL_BITS: u32 = OFFSET_BITS + TABLE_BITS + DIRECTORY_BITS;

/// Page (and frame) size in bytes (4096 = 2^12).
pub const PAGE_SIZE: usize = 1 << OFFSET_BITS;

/// Number of entries in a page directory.
pub const ENTRIES_PER_DIRECTORY: usize = 1 << TABLE_BITS;

/// Number of directories in the page table.
pub const DIRECTORY_COUNT: usize = 1 << DIRECTORY_BITS;

/// Number of physical frames.
pub const FRAME_COUNT: usize = 64;

/// Total size of physical memory in bytes.
pub const PHYSICAL_MEMORY_SIZE: usize = FRAME_COUNT * PAGE_SIZE;

/// Total size of the virtual address space in bytes.
pub const VIRTUAL_MEMORY_SIZE: u64 = 1 << VIRTUAL_BITS;

const OFFSET_MASK: u32 = (1 << OFFSET_BITS) - 1;
const TABLE_MASK: u32 = (1 << TABLE_BITS) - 1;
const DIRECTORY_MASK: u32 = (1 << DIRECTORY_BITS) - 1;

const TABLE_SHIFT: u32 = OFFSET_BITS;
const DIRECTORY_SHIFT: u32 = OFFSET_BITS + TABLE_BITS;

/// Returns the directory index (bits 22-31) of an address.
#[inline]
pub const fn directory_index(address: u32) -> usize {
    ((address >> DIRECTORY_SHIFT) & DIRECTORY_MASK) as usize
}

/// Returns the table index (bits 12-21) of an address.
#[inline]
pub const fn table_index(address: u32) -> usize {
    ((address >> TABLE_SHIFT) & TABLE_MASK) as usize
}

/// Returns the page offset (bits 0-11) of an address.
#[inline]
pub const fn page_offset(address: u32) -> usize {
    (address & OFFSET_MASK) as usize
}

/// Returns the virtual page number (the address with its offset bits removed).
#[inline]
pub const fn page_number(address: u32) -> u32 {
    address >> OFFSET_BITS
}

/// Builds an address from its three fields.
///
/// # Panics
/// Panics if any field is wider than its bit-field.
#[inline]
pub const fn compose(directory: usize, table: usize, offset: usize) -> u32 {
    assert!(directory < DIRECTORY_COUNT, "directory index out of range");
    assert!(table < ENTRIES_PER_DIRECTORY, "table index out of range");
    assert!(offset < PAGE_SIZE, "page offset out of range");
    ((directory as u32) << DIRECTORY_SHIFT) | ((table as u32) << TABLE_SHIFT) | offset as u32
}
