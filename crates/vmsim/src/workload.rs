//! Canonical workloads run against the emulator.

use anyhow::{Result, ensure};
use vmm::layout::{FRAME_COUNT, PAGE_SIZE};
use vmm::{TraceSink, VirtualMemory};

/// Number of `i32` elements in one page.
const PER_PAGE: usize = PAGE_SIZE / size_of::<i32>();

/// Touches `pages` consecutive pages, writing one `i32` at the start of each.
pub fn fill<S: TraceSink>(vm: &VirtualMemory<S>, pages: usize) -> Result<()> {
    let mut cursor = vm.allocate::<i32>(pages * PER_PAGE)?;
    for page in 0..pages {
        cursor.write(page as i32)?;
        cursor.step(PER_PAGE as isize);
    }
    log::info!("filled {} pages", pages);
    Ok(())
}

/// Writes `value`, touches enough other pages to evict it, then checks that it
/// comes back from the backing store intact.
pub fn sentinel<S: TraceSink>(vm: &VirtualMemory<S>, value: i32) -> Result<()> {
    let sentinel = vm.allocate::<i32>(1)?;
    let filler = vm.allocate::<i32>(FRAME_COUNT * PER_PAGE)?;

    sentinel.write(value)?;
    // The last element of each filler page lands on the next page boundary
    // past the sentinel's page.
    for page in 0..FRAME_COUNT {
        filler.element(page * PER_PAGE + PER_PAGE - 1).write(-1)?;
    }

    let found = sentinel.read()?;
    ensure!(
        found == value,
        "sentinel at {} changed: wrote {}, read {}",
        sentinel.address(),
        value,
        found
    );
    log::info!("sentinel {} survived eviction", value);
    Ok(())
}

/// Writes `i` to element `i` of an `elements`-long array, then verifies the
/// whole array `passes` times.
pub fn sweep<S: TraceSink>(vm: &VirtualMemory<S>, elements: usize, passes: usize) -> Result<()> {
    let array = vm.allocate::<i32>(elements)?;
    for i in 0..elements {
        array.element(i).write(i as i32)?;
    }

    for pass in 0..passes {
        for i in 0..elements {
            let found = array.element(i).read()?;
            ensure!(
                found == i as i32,
                "pass {}: element {} holds {}",
                pass,
                i,
                found
            );
        }
        log::info!("sweep pass {} verified {} elements", pass + 1, elements);
    }
    Ok(())
}
