//! Runtime configuration for the virtual memory manager.
//!
//! The machine geometry is fixed (see [`crate::layout`]); only the diagnostics
//! around backing-store growth can be tuned.

/// Number of distinct swapped pages after which the backing store reports pressure.
///
/// 104857 pages of 4KiB is roughly 400MiB of swapped data.
pub const DEFAULT_PRESSURE_THRESHOLD: usize = 104_857;

/// What the backing store does when it grows past its pressure threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressureAction {
    /// Keep growing silently.
    Ignore,
    /// Emit a log record at the given level for every new page past the threshold.
    Log(log::Level),
}

impl Default for PressureAction {
    fn default() -> Self {
        PressureAction::Log(log::Level::Warn)
    }
}

/// Configuration for the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackingStoreConfig {
    /// Number of distinct pages the store may hold before reporting pressure.
    pub pressure_threshold: usize,
    /// Action taken for each new page past the threshold.
    pub pressure_action: PressureAction,
}

impl BackingStoreConfig {
    /// Sets the pressure threshold.
    pub const fn with_pressure_threshold(mut self, threshold: usize) -> Self {
        self.pressure_threshold = threshold;
        self
    }

    /// Sets the pressure action.
    pub const fn with_pressure_action(mut self, action: PressureAction) -> Self {
        self.pressure_action = action;
        self
    }
}

impl Default for BackingStoreConfig {
    fn default() -> Self {
        Self {
            pressure_threshold: DEFAULT_PRESSURE_THRESHOLD,
            pressure_action: PressureAction::default(),
        }
    }
}

/// Configuration for a [`crate::VirtualMemory`] instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VmConfig {
    pub backing_store: BackingStoreConfig,
}

impl VmConfig {
    /// Replaces the backing store configuration.
    pub const fn with_backing_store(mut self, backing_store: BackingStoreConfig) -> Self {
        self.backing_store = backing_store;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_warn_past_threshold() {
        let config = VmConfig::default();
        assert_eq!(config.backing_store.pressure_threshold, DEFAULT_PRESSURE_THRESHOLD);
        assert_eq!(
            config.backing_store.pressure_action,
            PressureAction::Log(log::Level::Warn)
        );
    }

    #[test]
    fn builder_overrides() {
        let config = VmConfig::default().with_backing_store(
            BackingStoreConfig::default()
                .with_pressure_threshold(4)
                .with_pressure_action(PressureAction::Ignore),
        );
        assert_eq!(config.backing_store.pressure_threshold, 4);
        assert_eq!(config.backing_store.pressure_action, PressureAction::Ignore);
    }
}
