//! Human-readable size formatting for log messages.

use core::fmt;

/// Wraps a size in bytes and formats it with binary prefixes.
///
/// Sizes are shown in the largest unit they reach, with one decimal place when
/// the value is not a whole number of that unit (truncated, never rounded up).
///
/// # Examples
///
/// ```
/// use vmm::HumanSize;
///
/// assert_eq!(HumanSize(512).to_string(), "512B");
/// assert_eq!(HumanSize(4096).to_string(), "4KiB");
/// assert_eq!(HumanSize(262144).to_string(), "256KiB");
/// assert_eq!(HumanSize(1536).to_string(), "1.5KiB");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct HumanSize(pub usize);

impl fmt::Display for HumanSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];

        let mut unit = 0;
        let mut scale: usize = 1;
        while unit + 1 < UNITS.len() && self.0 / scale >= 1024 {
            scale *= 1024;
            unit += 1;
        }

        let whole = self.0 / scale;
        let tenths = (self.0 % scale) * 10 / scale;
        if tenths == 0 {
            write!(f, "{}{}", whole, UNITS[unit])
        } else {
            write!(f, "{}.{}{}", whole, tenths, UNITS[unit])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_bytes() {
        assert_eq!(HumanSize(0).to_string(), "0B");
        assert_eq!(HumanSize(1023).to_string(), "1023B");
    }

    #[test]
    fn formats_machine_sizes() {
        assert_eq!(HumanSize(4096).to_string(), "4KiB");
        assert_eq!(HumanSize(64 * 4096).to_string(), "256KiB");
        assert_eq!(HumanSize(104_857 * 4096).to_string(), "409.5MiB");
        assert_eq!(HumanSize(1 << 32).to_string(), "4GiB");
    }

    #[test]
    fn truncates_to_one_decimal() {
        assert_eq!(HumanSize(1025).to_string(), "1KiB");
        assert_eq!(HumanSize(1996).to_string(), "1.9KiB");
    }
}
