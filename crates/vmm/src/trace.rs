//! Access trace.
//!
//! Every translation produces one [`TraceRecord`]. Its CSV form has a fixed column
//! order and `0`/`1` booleans so that existing analysis tooling can consume it:
//!
//! ```text
//! page_number,virtual_address,physical_offset,page_fault,was_swapped,evicted_page_number,directory_allocated
//! ```

use alloc::vec::Vec;
use core::fmt;
use std::io::{self, Write};

use crate::{PageNumber, PhysicalAddress, VirtualAddress};

/// Header line written at the top of a CSV trace.
pub const CSV_HEADER: &str =
    "Page Number,Virtual Address,Physical Address,Page Fault,Swap,Evicted,Allocated Page Table Entries";

/// A summary of one translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRecord {
    pub page_number: PageNumber,
    pub virtual_address: VirtualAddress,
    /// Byte offset of the translated location within physical memory.
    pub physical_address: PhysicalAddress,
    pub page_fault: bool,
    pub was_swapped: bool,
    pub evicted_page: Option<PageNumber>,
    pub directory_allocated: bool,
}

impl fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let evicted = self.evicted_page.map_or(-1, |page| i64::from(page.get()));
        write!(
            f,
            "{},{},{},{},{},{},{}",
            self.page_number.get(),
            self.virtual_address.get(),
            self.physical_address.get(),
            u8::from(self.page_fault),
            u8::from(self.was_swapped),
            evicted,
            u8::from(self.directory_allocated)
        )
    }
}

/// A destination for trace records.
pub trait TraceSink {
    /// Records one translation.
    fn record(&mut self, record: &TraceRecord) -> io::Result<()>;

    /// Flushes buffered records, if any.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemoryTrace {
    records: Vec<TraceRecord>,
}

impl MemoryTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the records collected so far, oldest first.
    pub fn records(&self) -> &[TraceRecord] {
        &self.records
    }

    /// Removes and returns every record collected so far.
    pub fn take(&mut self) -> Vec<TraceRecord> {
        core::mem::take(&mut self.records)
    }
}

impl TraceSink for MemoryTrace {
    fn record(&mut self, record: &TraceRecord) -> io::Result<()> {
        self.records.push(*record);
        Ok(())
    }
}

/// Writes records as CSV lines, preceded by [`CSV_HEADER`].
pub struct CsvTrace<W: Write> {
    writer: W,
}

impl<W: Write> CsvTrace<W> {
    /// Creates a CSV trace and writes the header line.
    pub fn new(mut writer: W) -> io::Result<Self> {
        writeln!(writer, "{}", CSV_HEADER)?;
        Ok(Self { writer })
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TraceSink for CsvTrace<W> {
    fn record(&mut self, record: &TraceRecord) -> io::Result<()> {
        writeln!(self.writer, "{}", record)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTrace;

impl TraceSink for NullTrace {
    fn record(&mut self, _record: &TraceRecord) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(evicted: Option<u32>) -> TraceRecord {
        TraceRecord {
            page_number: PageNumber::new(64),
            virtual_address: VirtualAddress::new(64 * 4096 + 8),
            physical_address: PhysicalAddress::new(8),
            page_fault: true,
            was_swapped: evicted.is_some(),
            evicted_page: evicted.map(PageNumber::new),
            directory_allocated: false,
        }
    }

    #[test]
    fn formats_columns_in_order() {
        assert_eq!(sample(Some(0)).to_string(), "64,262152,8,1,1,0,0");
    }

    #[test]
    fn formats_missing_eviction_as_minus_one() {
        assert_eq!(sample(None).to_string(), "64,262152,8,1,0,-1,0");
    }

    #[test]
    fn csv_trace_writes_header_then_records() {
        let mut trace = CsvTrace::new(Vec::new()).unwrap();
        trace.record(&sample(None)).unwrap();
        trace.record(&sample(Some(3))).unwrap();
        trace.flush().unwrap();

        let text = String::from_utf8(trace.into_inner()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "64,262152,8,1,0,-1,0");
        assert_eq!(lines[2], "64,262152,8,1,1,3,0");
    }

    #[test]
    fn memory_trace_keeps_records() {
        let mut trace = MemoryTrace::new();
        trace.record(&sample(None)).unwrap();
        assert_eq!(trace.records().len(), 1);
        assert_eq!(trace.take().len(), 1);
        assert!(trace.records().is_empty());
    }
}
