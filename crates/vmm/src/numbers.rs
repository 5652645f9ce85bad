//! Page and frame numbers.
//!
//! A [`PageNumber`] names a 4KiB slice of the virtual address space; a
//! [`FrameNumber`] names one of the physical frames. Keeping them distinct types
//! stops a page number from being used as a frame index by accident.

use crate::{
    address::{PhysicalAddress, VirtualAddress},
    layout,
};
use core::fmt;

/// Generates a number newtype with its constructor, accessor and formatting.
macro_rules! impl_page_number_common {
    ($name:ident, $repr:ty, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        pub struct $name($repr);

        impl $name {
            /// Wraps a raw number.
            #[inline]
            pub const fn new(number: $repr) -> Self {
                Self(number)
            }

            /// Unwraps the raw number.
            #[inline]
            pub const fn get(self) -> $repr {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

impl_page_number_common!(
    FrameNumber,
    usize,
    "A physical frame number.\n\n\
     Frames are the 64 fixed 4KiB slots of the physical frame pool. A frame number\n\
     is the only handle to a frame; ownership moves by moving the number between\n\
     the free list and the page table's resident queue."
);

impl FrameNumber {
    /// Returns the frame number as an index.
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0
    }

    /// Returns the physical address at the start of this frame.
    #[inline]
    pub const fn start(self) -> PhysicalAddress {
        PhysicalAddress::new(self.0 * layout::PAGE_SIZE)
    }
}

impl_page_number_common!(
    PageNumber,
    u32,
    "A virtual page number (VPN).\n\n\
     A virtual address with its 12 offset bits removed. Page numbers key both the\n\
     page table walk and the backing store."
);

impl PageNumber {
    /// Returns the virtual address at the start of this page.
    #[inline]
    pub const fn start(self) -> VirtualAddress {
        VirtualAddress::new(self.0 << layout::OFFSET_BITS)
    }
}

impl From<VirtualAddress> for PageNumber {
    #[inline]
    fn from(addr: VirtualAddress) -> Self {
        addr.page_number()
    }
}

impl From<PhysicalAddress> for FrameNumber {
    #[inline]
    fn from(addr: PhysicalAddress) -> Self {
        addr.frame_number()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod frame_number {
        use super::*;

        #[test]
        fn start_address() {
            assert_eq!(FrameNumber::new(0).start().get(), 0);
            assert_eq!(FrameNumber::new(1).start().get(), 4096);
            assert_eq!(FrameNumber::new(63).start().get(), 63 * 4096);
        }

        #[test]
        fn from_physical_address() {
            let addr = PhysicalAddress::new(4096 * 3 + 10);
            assert_eq!(FrameNumber::from(addr), FrameNumber::new(3));
        }

        #[test]
        fn debug_format() {
            assert_eq!(format!("{:?}", FrameNumber::new(7)), "FrameNumber(7)");
            assert_eq!(format!("{}", FrameNumber::new(7)), "7");
        }
    }

    mod page_number {
        use super::*;

        #[test]
        fn start_address() {
            assert_eq!(PageNumber::new(0).start(), VirtualAddress::new(0));
            assert_eq!(PageNumber::new(5).start(), VirtualAddress::new(5 * 4096));
            assert_eq!(
                PageNumber::new((1 << 20) - 1).start(),
                VirtualAddress::new(0xFFFF_F000)
            );
        }

        #[test]
        fn from_virtual_address() {
            let addr = VirtualAddress::new(5 * 4096 + 100);
            assert_eq!(PageNumber::from(addr), PageNumber::new(5));
        }

        #[test]
        fn ordering() {
            assert!(PageNumber::new(1) < PageNumber::new(2));
        }
    }
}
