//! Physical address ranges.
//!
//! An [`AddrRange`] is a half-open interval `[start, end)` of the global
//! physical address space. Range lists are always kept in a `Vec` because the
//! engine decodes addresses first-match-wins over the declared order.
//!
//! # Example
//!
//! ```
//! use numa_topology::range::AddrRange;
//!
//! let low = AddrRange::new(0, 0x2000_0000);
//! let high = AddrRange::new(0x2000_0000, 0x4000_0000);
//!
//! assert!(low.contains(0x1fff_ffff));
//! assert!(!low.contains(0x2000_0000));
//! assert!(!low.overlaps(&high));
//! assert_eq!(low.to_string(), "[0x0, 0x20000000)");
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::size::ByteSize;
use crate::types::Addr;

/// A half-open interval of physical addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddrRange {
    /// First address in the range
    #[serde(deserialize_with = "deserialize_addr")]
    pub start: Addr,
    /// One past the last address in the range
    #[serde(deserialize_with = "deserialize_addr")]
    pub end: Addr,
}

fn deserialize_addr<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Addr, D::Error> {
    ByteSize::deserialize(deserializer).map(ByteSize::bytes)
}

impl AddrRange {
    /// Creates the range `[start, end)`.
    pub const fn new(start: Addr, end: Addr) -> Self {
        Self { start, end }
    }

    /// Creates the range `[start, start + size)`, or `None` if it would run
    /// past the end of the address space.
    pub fn checked_with_size(start: Addr, size: u64) -> Option<Self> {
        start.checked_add(size).map(|end| Self { start, end })
    }

    /// Number of bytes covered by the range.
    pub fn size(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Returns true if the range covers no addresses.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Returns true if `addr` falls inside the range.
    pub fn contains(&self, addr: Addr) -> bool {
        self.start <= addr && addr < self.end
    }

    /// Returns true if the two ranges share at least one address.
    pub fn overlaps(&self, other: &AddrRange) -> bool {
        self.intersection(other).is_some()
    }

    /// Returns the addresses covered by both ranges, if any.
    pub fn intersection(&self, other: &AddrRange) -> Option<AddrRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then_some(AddrRange { start, end })
    }
}

impl fmt::Display for AddrRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#x}, {:#x})", self.start, self.end)
    }
}

/// Returns true if any range in `ranges` contains `addr`.
pub fn any_contains(ranges: &[AddrRange], addr: Addr) -> bool {
    ranges.iter().any(|r| r.contains(addr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MIB;

    #[test]
    fn test_contains_is_half_open() {
        let range = AddrRange::new(0x1000, 0x2000);
        assert!(range.contains(0x1000));
        assert!(range.contains(0x1fff));
        assert!(!range.contains(0x2000));
        assert!(!range.contains(0xfff));
        assert_eq!(range.size(), 0x1000);
    }

    #[test]
    fn test_checked_with_size() {
        let range = AddrRange::checked_with_size(512 * MIB, 512 * MIB).unwrap();
        assert_eq!(range, AddrRange::new(512 * MIB, 1024 * MIB));
        assert!(AddrRange::checked_with_size(u64::MAX, 2).is_none());
    }

    #[test]
    fn test_overlap_and_intersection() {
        let a = AddrRange::new(0, 1024 * MIB);
        let b = AddrRange::new(512 * MIB, 1536 * MIB);
        let c = AddrRange::new(1024 * MIB, 2048 * MIB);

        assert!(a.overlaps(&b));
        assert_eq!(
            a.intersection(&b),
            Some(AddrRange::new(512 * MIB, 1024 * MIB))
        );
        // Adjacent ranges do not overlap
        assert!(!a.overlaps(&c));
        assert_eq!(a.intersection(&c), None);
    }

    #[test]
    fn test_empty_range() {
        let empty = AddrRange::new(0x100, 0x100);
        assert!(empty.is_empty());
        assert_eq!(empty.size(), 0);
        assert!(!empty.contains(0x100));
    }

    #[test]
    fn test_any_contains() {
        let ranges = vec![AddrRange::new(0, 0x10), AddrRange::new(0x20, 0x30)];
        assert!(any_contains(&ranges, 0x25));
        assert!(!any_contains(&ranges, 0x15));
    }

    #[test]
    fn test_deserialize_with_units() {
        let yaml = "start: 512MB\nend: 0x40000000\n";
        let range: AddrRange = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(range, AddrRange::new(512 * MIB, 1024 * MIB));
    }
}
