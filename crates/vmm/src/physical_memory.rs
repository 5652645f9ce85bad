//! Emulated physical memory.
//!
//! Physical memory is a single contiguous region of [`FRAME_COUNT`] frames of
//! [`PAGE_SIZE`] bytes each. Frames are only ever addressed by [`FrameNumber`].

use alloc::boxed::Box;
use alloc::vec;

use spin::Once;

use crate::layout::{FRAME_COUNT, PAGE_SIZE, PHYSICAL_MEMORY_SIZE};
use crate::{FrameNumber, HumanSize, PhysicalAddress, VmError};

/// The contents of one physical frame.
pub type FrameData = [u8; PAGE_SIZE];

/// One frame slot. Page alignment lets naturally aligned elements be referenced
/// in place.
#[derive(Clone)]
#[repr(C, align(4096))]
struct FrameSlot(FrameData);

/// Emulated physical memory for the virtual memory manager.
///
/// The backing region is allocated on first access, exactly once; until then the
/// pool costs nothing. Individual frames are never released, the region lives
/// as long as the `PhysicalMemory` value.
pub struct PhysicalMemory {
    region: Once<Box<[FrameSlot]>>,
}

impl PhysicalMemory {
    /// Creates a new physical memory. The frame region is not allocated yet.
    pub const fn new() -> Self {
        Self { region: Once::new() }
    }

    /// Returns whether the frame region has been allocated.
    pub fn is_materialized(&self) -> bool {
        self.region.is_completed()
    }

    /// Returns the number of frames in physical memory.
    pub const fn frame_count(&self) -> usize {
        FRAME_COUNT
    }

    /// Returns the frame with the given number.
    pub fn frame(&self, frame: FrameNumber) -> Result<&FrameData, VmError> {
        let index = Self::check(frame)?;
        Ok(&self.region()[index].0)
    }

    /// Returns the frame with the given number, mutably.
    pub fn frame_mut(&mut self, frame: FrameNumber) -> Result<&mut FrameData, VmError> {
        let index = Self::check(frame)?;
        Ok(&mut self.region_mut()?[index].0)
    }

    /// Fills a frame with zeroes.
    pub fn zero(&mut self, frame: FrameNumber) -> Result<(), VmError> {
        self.frame_mut(frame)?.fill(0);
        Ok(())
    }

    /// Returns a mutable byte slice of `len` bytes starting at `address`.
    ///
    /// The slice never crosses a frame boundary.
    pub fn bytes_mut(&mut self, address: PhysicalAddress, len: usize) -> Result<&mut [u8], VmError> {
        let offset = address.frame_offset();
        if offset + len > PAGE_SIZE {
            return Err(VmError::inconsistent(None, "access crosses a frame boundary"));
        }
        let frame = self.frame_mut(address.frame_number())?;
        Ok(&mut frame[offset..offset + len])
    }

    fn check(frame: FrameNumber) -> Result<usize, VmError> {
        let index = frame.as_usize();
        if index >= FRAME_COUNT {
            log::error!("frame {} requested from a {}-frame pool", index, FRAME_COUNT);
            return Err(VmError::InvalidFrame(index));
        }
        Ok(index)
    }

    fn region(&self) -> &[FrameSlot] {
        self.region.call_once(allocate_region)
    }

    fn region_mut(&mut self) -> Result<&mut [FrameSlot], VmError> {
        self.region.call_once(allocate_region);
        match self.region.get_mut() {
            Some(region) => Ok(&mut region[..]),
            None => Err(VmError::inconsistent(None, "frame region is not materialized")),
        }
    }
}

impl Default for PhysicalMemory {
    fn default() -> Self {
        Self::new()
    }
}

fn allocate_region() -> Box<[FrameSlot]> {
    log::debug!(
        "materializing physical memory: {} frames, {}",
        FRAME_COUNT,
        HumanSize(PHYSICAL_MEMORY_SIZE)
    );
    vec![FrameSlot([0; PAGE_SIZE]); FRAME_COUNT].into_boxed_slice()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lazily_materializes() {
        let mut pm = PhysicalMemory::new();
        assert!(!pm.is_materialized());

        pm.frame_mut(FrameNumber::new(0)).unwrap()[0] = 1;
        assert!(pm.is_materialized());
        assert_eq!(pm.frame(FrameNumber::new(0)).unwrap()[0], 1);
    }

    #[test]
    fn first_mutable_access_materializes() {
        let mut pm = PhysicalMemory::new();
        pm.zero(FrameNumber::new(63)).unwrap();
        assert!(pm.is_materialized());

        let at = PhysicalAddress::in_frame(FrameNumber::new(3), 16);
        pm.bytes_mut(at, 2).unwrap().copy_from_slice(&[7, 9]);
        assert_eq!(pm.frame(FrameNumber::new(3)).unwrap()[16..18], [7, 9]);
    }

    #[test]
    fn reuses_the_same_region() {
        let pm = PhysicalMemory::new();
        let first = pm.frame(FrameNumber::new(5)).unwrap().as_ptr();
        let second = pm.frame(FrameNumber::new(5)).unwrap().as_ptr();
        assert_eq!(first, second);
    }

    #[test]
    fn frames_are_contiguous_and_aligned() {
        let pm = PhysicalMemory::new();
        let base = pm.frame(FrameNumber::new(0)).unwrap().as_ptr() as usize;
        let last = pm.frame(FrameNumber::new(63)).unwrap().as_ptr() as usize;
        assert_eq!(base % PAGE_SIZE, 0);
        assert_eq!(last - base, 63 * PAGE_SIZE);
    }

    #[test]
    fn starts_zeroed() {
        let pm = PhysicalMemory::new();
        for i in 0..FRAME_COUNT {
            assert!(pm.frame(FrameNumber::new(i)).unwrap().iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn rejects_out_of_range_frames() {
        let mut pm = PhysicalMemory::new();
        assert!(matches!(
            pm.frame(FrameNumber::new(64)),
            Err(VmError::InvalidFrame(64))
        ));
        assert!(matches!(
            pm.frame_mut(FrameNumber::new(1000)),
            Err(VmError::InvalidFrame(1000))
        ));
    }

    #[test]
    fn zeroes_a_frame() {
        let mut pm = PhysicalMemory::new();
        pm.frame_mut(FrameNumber::new(2)).unwrap().fill(0xAA);
        pm.zero(FrameNumber::new(2)).unwrap();
        assert!(pm.frame(FrameNumber::new(2)).unwrap().iter().all(|&b| b == 0));
    }

    #[test]
    fn byte_slices_stay_inside_a_frame() {
        let mut pm = PhysicalMemory::new();
        let at = PhysicalAddress::in_frame(FrameNumber::new(1), 4092);
        assert_eq!(pm.bytes_mut(at, 4).unwrap().len(), 4);
        assert!(pm.bytes_mut(at, 8).is_err());
    }
}
