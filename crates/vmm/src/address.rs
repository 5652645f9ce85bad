//! Address types for the emulated machine.
//!
//! Virtual addresses are 32-bit values decomposed on demand into directory index,
//! table index and page offset. Physical addresses are byte offsets into the
//! physical frame pool.

use core::fmt;
use core::ops::{Add, Sub};

use crate::{FrameNumber, PageNumber, layout};

/// Generates an address newtype with the operations shared by virtual and
/// physical addresses.
macro_rules! impl_address_common {
    ($name:ident, $repr:ty, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[repr(transparent)]
        pub struct $name($repr);

        impl $name {
            /// Creates a new address.
            #[inline]
            pub const fn new(addr: $repr) -> Self {
                Self(addr)
            }

            /// Unwraps the raw address.
            #[inline]
            pub const fn get(self) -> $repr {
                self.0
            }

            /// Returns true if the address is a multiple of `align`.
            ///
            /// # Panics
            ///
            /// Panics if `align` is not a power of two.
            #[inline]
            pub const fn is_aligned(self, align: usize) -> bool {
                assert!(align.is_power_of_two(), "alignment must be a power of two");
                (self.0 as usize) & (align - 1) == 0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:#x})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:#x}", self.0)
            }
        }

        impl From<$repr> for $name {
            #[inline]
            fn from(addr: $repr) -> Self {
                Self::new(addr)
            }
        }

        impl Sub<$name> for $name {
            type Output = $repr;

            #[inline]
            fn sub(self, rhs: $name) -> Self::Output {
                self.0 - rhs.0
            }
        }
    };
}

impl_address_common!(
    VirtualAddress,
    u32,
    "A 32-bit virtual address.\n\n\
     The address is decomposed into three bit-fields: a 10-bit directory index,\n\
     a 10-bit table index and a 12-bit page offset. The decomposition is computed\n\
     on demand and never stored."
);

impl VirtualAddress {
    /// Builds a virtual address from its directory index, table index and offset.
    ///
    /// # Panics
    ///
    /// Panics if any field is wider than its bit-field.
    #[inline]
    pub const fn from_parts(directory: usize, table: usize, offset: usize) -> Self {
        Self(layout::compose(directory, table, offset))
    }

    /// Returns the directory index (bits 22-31).
    #[inline]
    pub const fn directory_index(self) -> usize {
        layout::directory_index(self.0)
    }

    /// Returns the table index (bits 12-21).
    #[inline]
    pub const fn table_index(self) -> usize {
        layout::table_index(self.0)
    }

    /// Returns the offset within the page (bits 0-11).
    #[inline]
    pub const fn page_offset(self) -> usize {
        layout::page_offset(self.0)
    }

    /// Returns the virtual page number containing this address.
    #[inline]
    pub const fn page_number(self) -> PageNumber {
        PageNumber::new(layout::page_number(self.0))
    }

    /// Returns the address moved by `delta` bytes, wrapping around the 32-bit space.
    #[inline]
    pub const fn wrapping_offset(self, delta: i64) -> Self {
        Self((self.0 as i64).wrapping_add(delta) as u32)
    }
}

impl Add<u32> for VirtualAddress {
    type Output = Self;

    #[inline]
    fn add(self, rhs: u32) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl_address_common!(
    PhysicalAddress,
    usize,
    "A physical address.\n\n\
     Physical addresses are byte offsets from the start of the physical frame pool,\n\
     so frame 0 starts at 0 and frame 63 ends at 256KiB."
);

impl PhysicalAddress {
    /// Returns the physical address of `offset` bytes into `frame`.
    ///
    /// # Panics
    ///
    /// Panics if `offset` does not fit inside a page.
    #[inline]
    pub const fn in_frame(frame: FrameNumber, offset: usize) -> Self {
        assert!(offset < layout::PAGE_SIZE, "page offset out of range");
        Self(frame.as_usize() * layout::PAGE_SIZE + offset)
    }

    /// Returns the frame this address falls into.
    #[inline]
    pub const fn frame_number(self) -> FrameNumber {
        FrameNumber::new(self.0 / layout::PAGE_SIZE)
    }

    /// Returns the offset of this address within its frame.
    #[inline]
    pub const fn frame_offset(self) -> usize {
        self.0 % layout::PAGE_SIZE
    }
}

impl Add<usize> for PhysicalAddress {
    type Output = Self;

    #[inline]
    fn add(self, rhs: usize) -> Self::Output {
        Self(self.0 + rhs)
    }
}
