//! Page table entry.

use crate::{FrameNumber, PageNumber};

use super::flags::PageFlags;

/// A single page table entry.
///
/// An entry exists only once its page has been touched. A present entry owns its
/// frame. A non-present entry still remembers the frame it last used, but the
/// page's content lives in the backing store and must be reloaded before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageEntry {
    frame: FrameNumber,
    page: PageNumber,
    flags: PageFlags,
}

impl PageEntry {
    /// Creates a present entry mapping `page` to `frame`.
    pub const fn new(page: PageNumber, frame: FrameNumber) -> Self {
        Self {
            frame,
            page,
            flags: PageFlags::present(),
        }
    }

    /// Returns the frame this entry maps (or last mapped, if swapped out).
    pub const fn frame(&self) -> FrameNumber {
        self.frame
    }

    /// Returns the virtual page number of this entry.
    pub const fn page(&self) -> PageNumber {
        self.page
    }

    /// Returns the flags for this entry.
    pub const fn flags(&self) -> PageFlags {
        self.flags
    }

    /// Returns whether this entry is present (valid).
    pub const fn is_present(&self) -> bool {
        self.flags.is_present()
    }

    /// Returns whether this entry's content has been swapped out.
    pub const fn is_swapped(&self) -> bool {
        self.flags.is_swapped()
    }

    /// Marks the entry swapped out. The frame number is retained.
    pub fn swap_out(&mut self) {
        self.flags.set_present(false);
        self.flags.set_swapped(true);
    }

    /// Makes the entry present again, now mapping `frame`.
    pub fn swap_in(&mut self, frame: FrameNumber) {
        self.frame = frame;
        self.flags.set_present(true);
        self.flags.set_swapped(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entry_is_present() {
        let entry = PageEntry::new(PageNumber::new(9), FrameNumber::new(4));
        assert!(entry.is_present());
        assert!(!entry.is_swapped());
        assert_eq!(entry.page(), PageNumber::new(9));
        assert_eq!(entry.frame(), FrameNumber::new(4));
    }

    #[test]
    fn swap_out_keeps_frame() {
        let mut entry = PageEntry::new(PageNumber::new(9), FrameNumber::new(4));
        entry.swap_out();
        assert!(!entry.is_present());
        assert!(entry.is_swapped());
        assert_eq!(entry.frame(), FrameNumber::new(4));
    }

    #[test]
    fn swap_in_remaps() {
        let mut entry = PageEntry::new(PageNumber::new(9), FrameNumber::new(4));
        entry.swap_out();
        entry.swap_in(FrameNumber::new(11));
        assert!(entry.is_present());
        assert!(!entry.is_swapped());
        assert_eq!(entry.frame(), FrameNumber::new(11));
        assert_eq!(entry.page(), PageNumber::new(9));
    }
}
