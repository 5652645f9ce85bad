//! Status flags shared by page table entries and page directories.

/// Status flags for a page table entry or a page directory.
///
/// Flags are stored as a raw byte with specific bits representing different states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageFlags(u8);

impl PageFlags {
    /// Present bit (bit 0). The mapping is valid and may be used for translation.
    const PRESENT: u8 = 1 << 0;

    /// Swapped bit (bit 1). The page's content lives in the backing store.
    const SWAPPED: u8 = 1 << 1;

    /// Creates empty flags (not present).
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Creates flags with only the present bit set.
    pub const fn present() -> Self {
        Self(Self::PRESENT)
    }

    /// Creates flags from a raw value.
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// Returns the raw value of these flags.
    pub const fn to_raw(self) -> u8 {
        self.0
    }

    /// Returns whether the present bit is set.
    pub const fn is_present(self) -> bool {
        (self.0 & Self::PRESENT) != 0
    }

    /// Sets or clears the present bit.
    pub fn set_present(&mut self, present: bool) {
        if present {
            self.0 |= Self::PRESENT;
        } else {
            self.0 &= !Self::PRESENT;
        }
    }

    /// Returns whether the swapped bit is set.
    pub const fn is_swapped(self) -> bool {
        (self.0 & Self::SWAPPED) != 0
    }

    /// Sets or clears the swapped bit.
    pub fn set_swapped(&mut self, swapped: bool) {
        if swapped {
            self.0 |= Self::SWAPPED;
        } else {
            self.0 &= !Self::SWAPPED;
        }
    }
}

impl Default for PageFlags {
    fn default() -> Self {
        Self::empty()
    }
}
