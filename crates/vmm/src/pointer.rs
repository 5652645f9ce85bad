//! Typed pointers into virtual memory.
//!
//! A [`VirtualPointer`] is a virtual address tagged with an element type and the
//! manager it belongs to. Moving it is plain address arithmetic; only
//! dereferencing touches the page table.

use core::cell::RefMut;
use core::fmt;
use core::marker::PhantomData;
use core::mem::size_of;
use core::ops::{Add, AddAssign, Deref, DerefMut, Sub, SubAssign};

use crate::trace::{MemoryTrace, TraceSink};
use crate::{VirtualAddress, VirtualMemory, VmError};

mod sealed {
    pub trait Sealed {}
}

/// A plain numeric type that can be stored in virtual memory.
///
/// # Safety
///
/// Implementors must be valid for every bit pattern and have a power-of-two size
/// of at most 8 bytes that is a multiple of their alignment.
pub unsafe trait Element: Copy + sealed::Sealed + 'static {
    /// Alignment of elements in virtual memory.
    ///
    /// Equal to the size, so an aligned element never crosses a page.
    const ALIGN: usize = size_of::<Self>();
}

macro_rules! impl_element {
    ($($ty:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            // SAFETY: primitive numbers accept any bit pattern and are at most
            // 8 bytes.
            unsafe impl Element for $ty {}
        )*
    };
}

impl_element!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

/// A pointer to a `T` in virtual memory.
///
/// Pointers are `Copy` and can be moved freely; arithmetic is in units of `T`
/// and wraps around the 32-bit address space.
pub struct VirtualPointer<'vm, T: Element, S: TraceSink = MemoryTrace> {
    address: VirtualAddress,
    memory: &'vm VirtualMemory<S>,
    _element: PhantomData<T>,
}

impl<'vm, T: Element, S: TraceSink> VirtualPointer<'vm, T, S> {
    pub(crate) fn new(memory: &'vm VirtualMemory<S>, address: VirtualAddress) -> Self {
        Self {
            address,
            memory,
            _element: PhantomData,
        }
    }

    /// Returns the virtual address this pointer refers to.
    pub fn address(&self) -> VirtualAddress {
        self.address
    }

    /// Moves the pointer by `delta` elements.
    pub fn step(&mut self, delta: isize) {
        *self = self.offset(delta);
    }

    /// Returns a pointer `delta` elements away.
    pub fn offset(self, delta: isize) -> Self {
        self.byte_offset((delta as i64).wrapping_mul(size_of::<T>() as i64) as isize)
    }

    /// Returns a pointer `bytes` bytes away, regardless of the element size.
    ///
    /// The result may be misaligned for `T`, in which case dereferencing it fails.
    pub fn byte_offset(self, bytes: isize) -> Self {
        Self {
            address: self.address.wrapping_offset(bytes as i64),
            ..self
        }
    }

    /// Returns a pointer to the element at `index`, counting from this one.
    pub fn element(self, index: usize) -> Self {
        self.offset(index as isize)
    }

    /// Translates the pointer and borrows the element it points to.
    ///
    /// The page is faulted in if needed and the access is traced. The returned
    /// guard borrows the whole manager: drop it before any other operation.
    pub fn deref_mut(&self) -> Result<ElementMut<'vm, T>, VmError> {
        if !self.address.is_aligned(T::ALIGN) {
            return Err(VmError::Misaligned {
                address: self.address,
                align: T::ALIGN,
            });
        }

        let memory = self.memory;
        let mut mmu = memory.borrow_mut()?;
        let location = mmu.translate(self.address)?;

        let element = RefMut::filter_map(mmu, |mmu| {
            let bytes = mmu.memory_mut().bytes_mut(location, size_of::<T>()).ok()?;
            let ptr = bytes.as_mut_ptr().cast::<T>();
            // SAFETY: `bytes` holds exactly one `T` inside a page-aligned frame,
            // at the same offset as the aligned virtual address, so `ptr` is
            // aligned. Every bit pattern is a valid `T`, and the reference is
            // tied to the exclusive borrow of the manager.
            Some(unsafe { &mut *ptr })
        })
        .map_err(|_| {
            log::error!("element at {} crosses a frame boundary", self.address);
            VmError::inconsistent(
                Some(self.address.page_number()),
                "element crosses a frame boundary",
            )
        })?;

        Ok(ElementMut { element })
    }

    /// Reads the element.
    pub fn read(&self) -> Result<T, VmError> {
        Ok(*self.deref_mut()?)
    }

    /// Overwrites the element with `value`.
    pub fn write(&self, value: T) -> Result<(), VmError> {
        *self.deref_mut()? = value;
        Ok(())
    }
}

impl<T: Element, S: TraceSink> Clone for VirtualPointer<'_, T, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Element, S: TraceSink> Copy for VirtualPointer<'_, T, S> {}

impl<T: Element, S: TraceSink> PartialEq for VirtualPointer<'_, T, S> {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address && core::ptr::eq(self.memory, other.memory)
    }
}

impl<T: Element, S: TraceSink> Eq for VirtualPointer<'_, T, S> {}

impl<T: Element, S: TraceSink> fmt::Debug for VirtualPointer<'_, T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VirtualPointer").field(&self.address).finish()
    }
}

impl<T: Element, S: TraceSink> Add<isize> for VirtualPointer<'_, T, S> {
    type Output = Self;

    fn add(self, rhs: isize) -> Self::Output {
        self.offset(rhs)
    }
}

impl<T: Element, S: TraceSink> Sub<isize> for VirtualPointer<'_, T, S> {
    type Output = Self;

    fn sub(self, rhs: isize) -> Self::Output {
        self.offset(rhs.wrapping_neg())
    }
}

impl<T: Element, S: TraceSink> AddAssign<isize> for VirtualPointer<'_, T, S> {
    fn add_assign(&mut self, rhs: isize) {
        self.step(rhs);
    }
}

impl<T: Element, S: TraceSink> SubAssign<isize> for VirtualPointer<'_, T, S> {
    fn sub_assign(&mut self, rhs: isize) {
        self.step(rhs.wrapping_neg());
    }
}

/// Exclusive access to an element in physical memory.
///
/// Returned by [`VirtualPointer::deref_mut`]. While it is alive the manager is
/// borrowed and every other operation on it fails with [`VmError::Busy`].
pub struct ElementMut<'vm, T> {
    element: RefMut<'vm, T>,
}

impl<T> Deref for ElementMut<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.element
    }
}

impl<T> DerefMut for ElementMut<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.element
    }
}

impl<T: fmt::Debug> fmt::Debug for ElementMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ElementMut").field(&*self.element).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PAGE_SIZE;

    mod arithmetic {
        use super::*;

        #[test]
        fn steps_by_element_size() {
            let vm = VirtualMemory::new();
            let mut p = vm.allocate::<u32>(8).unwrap();
            assert_eq!(p.address().get(), 0);

            p.step(3);
            assert_eq!(p.address().get(), 12);
            p.step(-1);
            assert_eq!(p.address().get(), 8);

            p += 2;
            assert_eq!(p.address().get(), 16);
            p -= 4;
            assert_eq!(p.address().get(), 0);

            assert_eq!((p + 5).address().get(), 20);
            assert_eq!(p + 5 - 5, p);
            assert_eq!(p.element(7).address().get(), 28);
        }

        #[test]
        fn wraps_around_the_address_space() {
            let vm = VirtualMemory::new();
            let p = vm.allocate::<u64>(1).unwrap();
            assert_eq!((p - 1).address().get(), u32::MAX - 7);
            assert_eq!((p - 1 + 1).address().get(), 0);
        }

        #[test]
        fn moving_does_not_translate() {
            let vm = VirtualMemory::new();
            let mut p = vm.allocate::<i16>(10_000).unwrap();
            for _ in 0..100 {
                p.step(50);
            }
            assert_eq!(vm.stats().unwrap().translations, 0);
        }

        #[test]
        fn pointers_from_different_managers_differ() {
            let a = VirtualMemory::new();
            let b = VirtualMemory::new();
            let pa = a.allocate::<u8>(1).unwrap();
            let pb = b.allocate::<u8>(1).unwrap();
            assert_eq!(pa.address(), pb.address());
            assert_ne!(pa, pb);
        }
    }

    mod access {
        use super::*;

        #[test]
        fn fresh_memory_reads_zero() {
            let vm = VirtualMemory::new();
            let p = vm.allocate::<f64>(4).unwrap();
            assert_eq!(p.element(3).read().unwrap(), 0.0);
        }

        #[test]
        fn writes_through_the_guard() {
            let vm = VirtualMemory::new();
            let p = vm.allocate::<i64>(2).unwrap();

            p.write(-40).unwrap();
            {
                let mut value = p.deref_mut().unwrap();
                *value += 2;
                assert_eq!(*value, -38);
            }
            assert_eq!(p.read().unwrap(), -38);
            assert_eq!(p.element(1).read().unwrap(), 0);
        }

        #[test]
        fn element_types_share_pages() {
            let vm = VirtualMemory::new();
            let bytes = vm.allocate::<u8>(3).unwrap();
            let word = vm.allocate::<u32>(1).unwrap();
            let float = vm.allocate::<f32>(1).unwrap();

            bytes.write(1).unwrap();
            word.write(0xDEAD_BEEF).unwrap();
            float.write(1.5).unwrap();

            assert_eq!(word.address().get(), 4);
            assert_eq!(bytes.read().unwrap(), 1);
            assert_eq!(word.read().unwrap(), 0xDEAD_BEEF);
            assert_eq!(float.read().unwrap(), 1.5);

            let stats = vm.stats().unwrap();
            assert_eq!(stats.faults, 1);
            assert_eq!(stats.translations, 6);
        }

        #[test]
        fn elements_never_cross_pages() {
            let vm = VirtualMemory::new();
            vm.allocate::<u8>(PAGE_SIZE - 3).unwrap();
            let value = vm.allocate::<u64>(1).unwrap();
            assert_eq!(value.address().get() as usize, PAGE_SIZE);
            value.write(u64::MAX).unwrap();
            assert_eq!(value.read().unwrap(), u64::MAX);
        }

        #[test]
        fn misaligned_access_is_rejected() {
            let vm = VirtualMemory::new();
            let p = vm.allocate::<u32>(2).unwrap().byte_offset(2);

            let err = p.read().unwrap_err();
            assert!(matches!(err, VmError::Misaligned { align: 4, .. }));
            assert!(!err.is_invariant_violation());
            assert_eq!(vm.stats().unwrap().translations, 0);
        }

        #[test]
        fn one_translation_per_access() {
            let vm = VirtualMemory::new();
            let p = vm.allocate::<u16>(4).unwrap();
            p.write(9).unwrap();
            p.read().unwrap();
            let records = vm.inspect_trace(|trace| trace.records().len()).unwrap();
            assert_eq!(records, 2);
        }
    }
}
