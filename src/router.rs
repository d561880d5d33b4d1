//! Directional routing between each domain and the shared backbone.
//!
//! Every domain gets two stateless, range-gated filters:
//!
//! - the **downward** filter sits between the domain's local bus (upstream)
//!   and the backbone (downstream) and matches every *other* domain's range
//!   plus the bridge ranges, so non-local and I/O traffic leaves the domain;
//! - the **upward** filter sits between the backbone (upstream) and the local
//!   bus (downstream) and matches only the domain's own range.
//!
//! Routing is therefore pure range membership, and a wired topology can be
//! checked with [`resolve_route`] before any simulation runs.
//!
//! Overlapping domain ranges are encoded into the filters verbatim.

use serde::{Deserialize, Serialize};

use crate::component::{Bus, RoutingFilter};
use crate::domain::Domain;
use crate::error::TopologyResult;
use crate::instantiate::Instantiator;
use crate::range::AddrRange;
use crate::types::{Addr, DomainId};

/// The two filters wired for one domain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomainFilters {
    pub downward: RoutingFilter,
    pub upward: RoutingFilter,
}

/// Computes and wires the per-domain filters.
#[derive(Clone, Copy, Debug)]
pub struct DomainRouterBuilder<'a> {
    domain_ranges: &'a [AddrRange],
    bridge_ranges: &'a [AddrRange],
}

impl<'a> DomainRouterBuilder<'a> {
    /// `domain_ranges[i]` must be the range of domain `i`.
    pub fn new(domain_ranges: &'a [AddrRange], bridge_ranges: &'a [AddrRange]) -> Self {
        Self {
            domain_ranges,
            bridge_ranges,
        }
    }

    /// Ranges the upward filter of `id` forwards: exactly its own range.
    pub fn upward_ranges(&self, id: DomainId) -> Vec<AddrRange> {
        self.domain_ranges
            .get(id as usize)
            .copied()
            .into_iter()
            .collect()
    }

    /// Ranges the downward filter of `id` forwards: every other domain's
    /// range in id order, followed by the bridge ranges.
    pub fn downward_ranges(&self, id: DomainId) -> Vec<AddrRange> {
        self.domain_ranges
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != id as usize)
            .map(|(_, range)| *range)
            .chain(self.bridge_ranges.iter().copied())
            .collect()
    }

    /// Instantiates both filters of domain `id` and wires them between its
    /// local bus and the backbone.
    pub fn build(
        &self,
        id: DomainId,
        local_bus: &Bus,
        backbone: &Bus,
        inst: &mut Instantiator<'_>,
    ) -> TopologyResult<DomainFilters> {
        let prefix = Domain::prefix(id);

        let downward = inst.filter(
            &format!("{prefix}.numa_cache_downward"),
            self.downward_ranges(id),
            local_bus.master(),
            backbone.slave(),
        )?;
        let upward = inst.filter(
            &format!("{prefix}.numa_cache_upward"),
            self.upward_ranges(id),
            backbone.master(),
            local_bus.slave(),
        )?;

        tracing::debug!(
            domain = id,
            downward = downward.address_ranges.len(),
            upward = upward.address_ranges.len(),
            "wired domain filters"
        );

        Ok(DomainFilters { downward, upward })
    }
}

/// Where an access issued inside a domain ends up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    /// Served on the issuing domain's local bus
    Local,
    /// Forwarded down to the backbone and up into exactly one other domain
    Remote(DomainId),
    /// Forwarded to the backbone and accepted by no domain: bridge traffic
    Bridge,
    /// Accepted by more than one domain (overlapping ranges)
    Ambiguous(Vec<DomainId>),
    /// Matched by nothing
    Unmapped,
}

/// Resolves the route of an access to `addr` issued in domain `from`.
///
/// `domains[i]` must be domain `i`. Returns `None` if `from` is not a domain.
pub fn resolve_route(domains: &[Domain], from: DomainId, addr: Addr) -> Option<Route> {
    let source = domains.get(from as usize)?;
    let local = source.owns(addr);
    let forwarded = source.downward_filter.matches(addr);

    let mut accepting = Vec::new();
    if local {
        accepting.push(from);
    }
    if forwarded {
        accepting.extend(
            domains
                .iter()
                .filter(|d| d.id != from && d.upward_filter.matches(addr))
                .map(|d| d.id),
        );
    }

    accepting.sort_unstable();
    let route = match accepting.len() {
        0 if forwarded => Route::Bridge,
        0 => Route::Unmapped,
        1 if accepting[0] == from => Route::Local,
        1 => Route::Remote(accepting[0]),
        _ => Route::Ambiguous(accepting),
    };
    Some(route)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::PortRole;
    use crate::registry::create_default_registry;
    use crate::types::MIB;

    fn three_domains() -> Vec<AddrRange> {
        vec![
            AddrRange::new(0, 512 * MIB),
            AddrRange::new(512 * MIB, 1024 * MIB),
            AddrRange::new(1024 * MIB, 1536 * MIB),
        ]
    }

    fn bridge() -> Vec<AddrRange> {
        vec![AddrRange::new(0x800_0000_0000, u64::MAX)]
    }

    #[test]
    fn test_upward_is_own_range() {
        let ranges = three_domains();
        let bridge = bridge();
        let router = DomainRouterBuilder::new(&ranges, &bridge);

        for id in 0..3 {
            assert_eq!(router.upward_ranges(id), vec![ranges[id as usize]]);
        }
    }

    #[test]
    fn test_downward_is_others_then_bridge() {
        let ranges = three_domains();
        let bridge = bridge();
        let router = DomainRouterBuilder::new(&ranges, &bridge);

        assert_eq!(
            router.downward_ranges(0),
            vec![ranges[1], ranges[2], bridge[0]]
        );
        assert_eq!(
            router.downward_ranges(1),
            vec![ranges[0], ranges[2], bridge[0]]
        );
        assert_eq!(
            router.downward_ranges(2),
            vec![ranges[0], ranges[1], bridge[0]]
        );
        for id in 0..3 {
            assert!(!router.downward_ranges(id).contains(&ranges[id as usize]));
        }
    }

    #[test]
    fn test_single_domain_downward_is_bridge_only() {
        let ranges = vec![AddrRange::new(0, 512 * MIB)];
        let bridge = bridge();
        let router = DomainRouterBuilder::new(&ranges, &bridge);

        assert_eq!(router.downward_ranges(0), bridge);
        assert_eq!(router.upward_ranges(0), ranges);
    }

    #[test]
    fn test_no_bridge_ranges() {
        let ranges = three_domains();
        let router = DomainRouterBuilder::new(&ranges, &[]);
        assert_eq!(router.downward_ranges(1), vec![ranges[0], ranges[2]]);
    }

    #[test]
    fn test_build_wiring() {
        let registry = create_default_registry();
        let mut inst = Instantiator::new(&registry);
        let backbone = inst.bus("SystemXBar", "systembus").unwrap();
        let local = inst.bus("SystemXBar", "domain1.membus").unwrap();

        let ranges = three_domains();
        let bridge = bridge();
        let filters = DomainRouterBuilder::new(&ranges, &bridge)
            .build(1, &local, &backbone, &mut inst)
            .unwrap();

        assert_eq!(filters.downward.desc.name, "domain1.numa_cache_downward");
        assert_eq!(filters.downward.upstream, local.master());
        assert_eq!(filters.downward.downstream, backbone.slave());
        assert_eq!(filters.downward.downstream.role, PortRole::Slave);

        assert_eq!(filters.upward.desc.name, "domain1.numa_cache_upward");
        assert_eq!(filters.upward.upstream, backbone.master());
        assert_eq!(filters.upward.downstream, local.slave());
        assert_eq!(filters.upward.address_ranges, vec![ranges[1]]);
    }
}
