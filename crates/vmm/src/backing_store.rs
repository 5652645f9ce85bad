//! Backing store (swap device) for evicted pages.
//!
//! The store is an unbounded map from [`PageNumber`] to a full copy of the page's
//! frame. Records are overwritten on every eviction and never removed, so a page
//! can be swapped out and back in any number of times.

use alloc::boxed::Box;
use std::collections::HashMap;

use crate::config::{BackingStoreConfig, PressureAction};
use crate::physical_memory::FrameData;
use crate::{HumanSize, PageNumber, layout};

/// An emulated swap device keyed by virtual page number.
pub struct BackingStore {
    config: BackingStoreConfig,
    pages: HashMap<PageNumber, Box<FrameData>>,
    pressure_reports: usize,
}

impl BackingStore {
    /// Creates an empty backing store.
    pub fn new(config: BackingStoreConfig) -> Self {
        Self {
            config,
            pages: HashMap::new(),
            pressure_reports: 0,
        }
    }

    /// Stores a copy of `frame` as the content of `page`, replacing any earlier copy.
    pub fn write(&mut self, page: PageNumber, frame: &FrameData) {
        match self.pages.get_mut(&page) {
            Some(record) => record.copy_from_slice(frame),
            None => {
                self.pages.insert(page, Box::new(*frame));
                self.check_pressure();
            }
        }
    }

    /// Copies the stored content of `page` into `frame`.
    ///
    /// Returns false, leaving `frame` untouched, if the page has never been written.
    pub fn read(&self, page: PageNumber, frame: &mut FrameData) -> bool {
        match self.pages.get(&page) {
            Some(record) => {
                frame.copy_from_slice(&record[..]);
                true
            }
            None => false,
        }
    }

    /// Returns true if the store holds a record for `page`.
    pub fn contains(&self, page: PageNumber) -> bool {
        self.pages.contains_key(&page)
    }

    /// Returns the number of distinct pages stored.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Returns true if no page has been written yet.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Returns how many times growth past the pressure threshold was reported.
    pub fn pressure_reports(&self) -> usize {
        self.pressure_reports
    }

    /// Returns the configuration of this store.
    pub fn config(&self) -> &BackingStoreConfig {
        &self.config
    }

    fn check_pressure(&mut self) {
        if self.pages.len() <= self.config.pressure_threshold {
            return;
        }
        if let PressureAction::Log(level) = self.config.pressure_action {
            self.pressure_reports += 1;
            log::log!(
                level,
                "backing store holds {} pages ({}), past the threshold of {}",
                self.pages.len(),
                HumanSize(self.pages.len() * layout::PAGE_SIZE),
                self.config.pressure_threshold
            );
        }
    }
}

impl Default for BackingStore {
    fn default() -> Self {
        Self::new(BackingStoreConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PAGE_SIZE;

    fn filled(byte: u8) -> FrameData {
        [byte; PAGE_SIZE]
    }

    #[test]
    fn starts_empty() {
        let store = BackingStore::default();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert!(!store.contains(PageNumber::new(0)));
    }

    #[test]
    fn round_trips_a_frame() {
        let mut store = BackingStore::default();
        let mut frame = filled(0);
        frame[0] = 1;
        frame[PAGE_SIZE - 1] = 2;
        store.write(PageNumber::new(7), &frame);

        let mut out = filled(0xFF);
        assert!(store.read(PageNumber::new(7), &mut out));
        assert_eq!(out, frame);
    }

    #[test]
    fn miss_leaves_buffer_untouched() {
        let store = BackingStore::default();
        let mut out = filled(0x5A);
        assert!(!store.read(PageNumber::new(3), &mut out));
        assert!(out.iter().all(|&b| b == 0x5A));
    }

    #[test]
    fn overwrites_without_growing() {
        let mut store = BackingStore::default();
        store.write(PageNumber::new(1), &filled(1));
        store.write(PageNumber::new(1), &filled(2));
        assert_eq!(store.len(), 1);

        let mut out = filled(0);
        assert!(store.read(PageNumber::new(1), &mut out));
        assert_eq!(out, filled(2));
    }

    #[test]
    fn keeps_every_page() {
        let mut store = BackingStore::default();
        for page in 0..200u32 {
            store.write(PageNumber::new(page), &filled(page as u8));
        }
        assert_eq!(store.len(), 200);

        let mut out = filled(0);
        for page in 0..200u32 {
            assert!(store.read(PageNumber::new(page), &mut out));
            assert_eq!(out[123], page as u8);
        }
    }

    #[test]
    fn growth_past_threshold_is_not_fatal() {
        let config = BackingStoreConfig::default()
            .with_pressure_threshold(2)
            .with_pressure_action(PressureAction::Log(log::Level::Info));
        let mut store = BackingStore::new(config);
        for page in 0..5u32 {
            store.write(PageNumber::new(page), &filled(0));
        }
        assert_eq!(store.len(), 5);
        assert_eq!(store.config().pressure_threshold, 2);
    }

    #[test]
    fn reports_each_new_page_past_threshold() {
        let config = BackingStoreConfig::default().with_pressure_threshold(2);
        let mut store = BackingStore::new(config);

        store.write(PageNumber::new(0), &filled(0));
        store.write(PageNumber::new(1), &filled(0));
        assert_eq!(store.pressure_reports(), 0);

        store.write(PageNumber::new(2), &filled(0));
        assert_eq!(store.pressure_reports(), 1);
        store.write(PageNumber::new(3), &filled(0));
        assert_eq!(store.pressure_reports(), 2);

        // Rewriting a known page does not grow the store.
        store.write(PageNumber::new(0), &filled(1));
        store.write(PageNumber::new(3), &filled(1));
        assert_eq!(store.pressure_reports(), 2);
    }

    #[test]
    fn ignore_never_reports() {
        let config = BackingStoreConfig::default()
            .with_pressure_threshold(0)
            .with_pressure_action(PressureAction::Ignore);
        let mut store = BackingStore::new(config);
        for page in 0..10u32 {
            store.write(PageNumber::new(page), &filled(0));
        }
        assert_eq!(store.len(), 10);
        assert_eq!(store.pressure_reports(), 0);
    }
}
