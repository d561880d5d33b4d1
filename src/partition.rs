//! Partitioning of the global physical address space across domains.
//!
//! Domain `i` owns `[i * slice_size, i * slice_size + per_domain_size)`. The
//! slice size is a stride independent of the per-domain size, so a domain
//! larger than its slice overlaps its successor. The partitioner does not
//! correct or reject that case; [`overlapping_pairs`] lets callers report it.
//!
//! # Example
//!
//! ```
//! use numa_topology::partition::{AddressSpacePartitioner, SLICE_SIZE};
//! use numa_topology::range::AddrRange;
//! use numa_topology::types::MIB;
//!
//! let partitioner = AddressSpacePartitioner::new(SLICE_SIZE, 512 * MIB);
//! let ranges = partitioner.partition(2).unwrap();
//!
//! assert_eq!(ranges[0], AddrRange::new(0, 512 * MIB));
//! assert_eq!(ranges[1], AddrRange::new(512 * MIB, 1024 * MIB));
//! ```

use crate::config::{ConfigError, ConfigResult, NumaParams};
use crate::range::AddrRange;
use crate::types::{DomainId, MIB};

/// Default stride between consecutive domain base addresses.
pub const SLICE_SIZE: u64 = 512 * MIB;

/// Computes one address range per domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressSpacePartitioner {
    slice_size: u64,
    per_domain_size: u64,
}

impl AddressSpacePartitioner {
    /// Creates a partitioner with an explicit slice stride.
    pub fn new(slice_size: u64, per_domain_size: u64) -> Self {
        Self {
            slice_size,
            per_domain_size,
        }
    }

    /// Creates a partitioner from the NUMA section of the configuration.
    pub fn from_params(params: &NumaParams) -> Self {
        Self::new(params.slice_size.bytes(), params.mem_size_per_domain.bytes())
    }

    pub fn slice_size(&self) -> u64 {
        self.slice_size
    }

    pub fn per_domain_size(&self) -> u64 {
        self.per_domain_size
    }

    /// Returns true if the configured sizes guarantee disjoint ranges.
    pub fn is_disjoint(&self) -> bool {
        self.per_domain_size <= self.slice_size
    }

    /// Returns the range owned by domain `id`.
    pub fn range_for(&self, id: DomainId) -> ConfigResult<AddrRange> {
        u64::from(id)
            .checked_mul(self.slice_size)
            .and_then(|base| AddrRange::checked_with_size(base, self.per_domain_size))
            .ok_or_else(|| {
                ConfigError::Validation(format!(
                    "Domain {id} range exceeds the physical address space"
                ))
            })
    }

    /// Returns the ranges of domains `0..domain_count`, indexed by domain id.
    pub fn partition(&self, domain_count: u32) -> ConfigResult<Vec<AddrRange>> {
        (0..domain_count).map(|id| self.range_for(id)).collect()
    }
}

/// Returns every pair of indices `(i, j)` with `i < j` whose ranges overlap.
pub fn overlapping_pairs(ranges: &[AddrRange]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for (i, a) in ranges.iter().enumerate() {
        for (j, b) in ranges.iter().enumerate().skip(i + 1) {
            if a.overlaps(b) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::size::ByteSize;
    use crate::types::GIB;

    #[test]
    fn test_two_domains() {
        let ranges = AddressSpacePartitioner::new(SLICE_SIZE, 512 * MIB)
            .partition(2)
            .unwrap();
        assert_eq!(
            ranges,
            vec![
                AddrRange::new(0, 512 * MIB),
                AddrRange::new(512 * MIB, 1024 * MIB),
            ]
        );
    }

    #[test]
    fn test_three_domains() {
        let ranges = AddressSpacePartitioner::new(SLICE_SIZE, 512 * MIB)
            .partition(3)
            .unwrap();
        let starts: Vec<_> = ranges.iter().map(|r| r.start).collect();
        assert_eq!(starts, vec![0, 512 * MIB, 1024 * MIB]);
        assert!(ranges.iter().all(|r| r.size() == 512 * MIB));
        assert!(overlapping_pairs(&ranges).is_empty());
    }

    #[test]
    fn test_disjoint_and_ordered_for_many_counts() {
        for size in [MIB, 256 * MIB, 512 * MIB] {
            let partitioner = AddressSpacePartitioner::new(SLICE_SIZE, size);
            assert!(partitioner.is_disjoint());
            for n in 1..=16 {
                let ranges = partitioner.partition(n).unwrap();
                assert_eq!(ranges.len(), n as usize);
                assert!(overlapping_pairs(&ranges).is_empty());
                assert!(ranges.windows(2).all(|w| w[0].start < w[1].start));
                for (id, range) in ranges.iter().enumerate() {
                    assert_eq!(range.start, id as u64 * SLICE_SIZE);
                }
            }
        }
    }

    #[test]
    fn test_single_domain() {
        let ranges = AddressSpacePartitioner::new(SLICE_SIZE, 128 * MIB)
            .partition(1)
            .unwrap();
        assert_eq!(ranges, vec![AddrRange::new(0, 128 * MIB)]);
    }

    #[test]
    fn test_oversized_domains_overlap() {
        let partitioner = AddressSpacePartitioner::new(SLICE_SIZE, GIB);
        assert!(!partitioner.is_disjoint());

        let ranges = partitioner.partition(2).unwrap();
        assert_eq!(ranges[0], AddrRange::new(0, GIB));
        assert_eq!(ranges[1], AddrRange::new(512 * MIB, 512 * MIB + GIB));
        assert_eq!(
            ranges[0].intersection(&ranges[1]),
            Some(AddrRange::new(512 * MIB, 1024 * MIB))
        );
        assert_eq!(overlapping_pairs(&ranges), vec![(0, 1)]);
    }

    #[test]
    fn test_from_params() {
        let params = NumaParams {
            mem_size_per_domain: ByteSize::mib(256),
            slice_size: ByteSize::gib(1),
            ..NumaParams::default()
        };
        let partitioner = AddressSpacePartitioner::from_params(&params);
        assert_eq!(partitioner.slice_size(), GIB);
        assert_eq!(partitioner.per_domain_size(), 256 * MIB);
        assert_eq!(
            partitioner.range_for(3).unwrap(),
            AddrRange::new(3 * GIB, 3 * GIB + 256 * MIB)
        );
    }

    #[test]
    fn test_address_space_overflow() {
        let partitioner = AddressSpacePartitioner::new(u64::MAX / 2, u64::MAX / 2);
        assert!(partitioner.partition(2).is_ok());
        assert!(matches!(
            partitioner.partition(3),
            Err(ConfigError::Validation(_))
        ));
    }
}
