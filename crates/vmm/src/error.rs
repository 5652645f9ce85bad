use core::fmt;
use std::io;

use crate::{PageNumber, VirtualAddress};

/// Errors that can occur while allocating or translating virtual memory.
#[derive(Debug)]
pub enum VmError {
    /// The bump allocator cannot fit the request into the 4GiB address space.
    OutOfVirtualMemory {
        /// Bytes requested, including alignment padding.
        requested: u64,
        /// Bytes still available.
        available: u64,
    },
    /// A frame index outside `[0, 64)` was requested from physical memory.
    InvalidFrame(usize),
    /// A swapped-out page has no record in the backing store.
    MissingSwapRecord(PageNumber),
    /// The page table and the resident queue disagree.
    Inconsistent {
        page: Option<PageNumber>,
        reason: &'static str,
    },
    /// The address is not aligned for the element type being dereferenced.
    Misaligned {
        address: VirtualAddress,
        align: usize,
    },
    /// The memory manager is already borrowed by an outstanding element reference.
    Busy,
    /// The trace sink failed to record an access.
    Trace(io::Error),
}

impl VmError {
    /// Returns true if this error indicates broken internal bookkeeping rather than
    /// an expected failure the caller can handle.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            VmError::InvalidFrame(_) | VmError::MissingSwapRecord(_) | VmError::Inconsistent { .. }
        )
    }

    pub(crate) fn inconsistent(page: Option<PageNumber>, reason: &'static str) -> Self {
        VmError::Inconsistent { page, reason }
    }
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmError::OutOfVirtualMemory {
                requested,
                available,
            } => write!(
                f,
                "out of virtual memory: requested {} bytes, {} available",
                requested, available
            ),
            VmError::InvalidFrame(index) => write!(f, "invalid frame number {}", index),
            VmError::MissingSwapRecord(page) => {
                write!(f, "page {} is swapped out but has no backing store record", page)
            }
            VmError::Inconsistent {
                page: Some(page),
                reason,
            } => write!(f, "page table inconsistency at page {}: {}", page, reason),
            VmError::Inconsistent { page: None, reason } => {
                write!(f, "page table inconsistency: {}", reason)
            }
            VmError::Misaligned { address, align } => {
                write!(f, "address {} is not aligned to {} bytes", address, align)
            }
            VmError::Busy => f.write_str("virtual memory is already borrowed"),
            VmError::Trace(err) => write!(f, "failed to write access trace: {}", err),
        }
    }
}

impl std::error::Error for VmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VmError::Trace(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for VmError {
    fn from(err: io::Error) -> Self {
        VmError::Trace(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_invariant_violations() {
        assert!(VmError::InvalidFrame(64).is_invariant_violation());
        assert!(VmError::MissingSwapRecord(PageNumber::new(1)).is_invariant_violation());
        assert!(VmError::inconsistent(None, "empty queue").is_invariant_violation());

        assert!(
            !VmError::OutOfVirtualMemory {
                requested: 8,
                available: 4
            }
            .is_invariant_violation()
        );
        assert!(!VmError::Busy.is_invariant_violation());
    }

    #[test]
    fn displays() {
        assert_eq!(
            VmError::InvalidFrame(64).to_string(),
            "invalid frame number 64"
        );
        assert_eq!(
            VmError::inconsistent(Some(PageNumber::new(3)), "entry missing").to_string(),
            "page table inconsistency at page 3: entry missing"
        );
    }
}
