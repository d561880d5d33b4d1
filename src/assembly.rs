//! Flattening of per-domain artifacts into system-wide collections.
//!
//! # Ordering contract
//!
//! Every collection in [`NumaSystem`] is ordered by ascending domain id, and
//! `mem_ranges` lists the base-system ranges first followed by each domain's
//! range in id order. The engine decodes addresses first-match-wins over
//! that declared order, so it must not be rearranged.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::component::{Bus, Cache, Component, ComputeUnit, MemoryController, RoutingFilter};
use crate::domain::Domain;
use crate::range::AddrRange;
use crate::router::{resolve_route, Route};
use crate::system::BaseSystem;
use crate::types::{Addr, DomainId};

/// Boot parameters forwarded to the engine.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootParams {
    pub kernel: Option<PathBuf>,
    /// Resolved kernel command line
    pub command_line: Option<String>,
    pub script: Option<PathBuf>,
    pub init_param: u64,
    pub lpae: bool,
    pub virtualisation: bool,
}

/// A fully wired NUMA machine, ready to be handed to the engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NumaSystem {
    pub base: BaseSystem,
    pub boot: BootParams,
    /// Base ranges, then domain ranges in id order
    pub mem_ranges: Vec<AddrRange>,
    pub memory_controllers: Vec<MemoryController>,
    pub local_buses: Vec<Bus>,
    pub l2_buses: Vec<Bus>,
    pub l2_caches: Vec<Cache>,
    pub downward_filters: Vec<RoutingFilter>,
    pub upward_filters: Vec<RoutingFilter>,
    pub compute_units: Vec<ComputeUnit>,
    domains: Vec<Domain>,
}

impl NumaSystem {
    /// The domains the system was assembled from, indexed by id.
    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }

    pub fn domain_count(&self) -> usize {
        self.domains.len()
    }

    /// Range owned by domain `id`.
    pub fn domain_range(&self, id: DomainId) -> Option<AddrRange> {
        self.domains.get(id as usize).map(|d| d.range)
    }

    /// Resolves where an access to `addr` issued in domain `from` is served.
    pub fn route(&self, from: DomainId, addr: Addr) -> Option<Route> {
        resolve_route(&self.domains, from, addr)
    }

    /// Every component of the system, base system first, then per kind in
    /// domain order.
    pub fn components(&self) -> Vec<&dyn Component> {
        let mut all = vec![
            &self.base.system_bus as &dyn Component,
            &self.base.io_bus,
            &self.base.io_cache,
        ];
        all.extend(self.local_buses.iter().map(|c| c as &dyn Component));
        all.extend(self.l2_buses.iter().map(|c| c as &dyn Component));
        all.extend(self.l2_caches.iter().map(|c| c as &dyn Component));
        all.extend(self.compute_units.iter().map(|c| c as &dyn Component));
        all.extend(self.memory_controllers.iter().map(|c| c as &dyn Component));
        all.extend(self.downward_filters.iter().map(|c| c as &dyn Component));
        all.extend(self.upward_filters.iter().map(|c| c as &dyn Component));
        all
    }
}

/// Aggregates domains into a [`NumaSystem`].
#[derive(Debug)]
pub struct SystemAssembler {
    base: BaseSystem,
    boot: BootParams,
}

impl SystemAssembler {
    pub fn new(base: BaseSystem, boot: BootParams) -> Self {
        Self { base, boot }
    }

    /// Consumes the domains and produces the system-wide collections.
    ///
    /// Domains are sorted by id first, so callers may pass them in any order.
    pub fn assemble(self, mut domains: Vec<Domain>) -> NumaSystem {
        domains.sort_by_key(|d| d.id);

        let mut mem_ranges = self.base.mem_ranges.clone();
        let mut memory_controllers = Vec::new();
        let mut local_buses = Vec::with_capacity(domains.len());
        let mut l2_buses = Vec::with_capacity(domains.len());
        let mut l2_caches = Vec::with_capacity(domains.len());
        let mut downward_filters = Vec::with_capacity(domains.len());
        let mut upward_filters = Vec::with_capacity(domains.len());
        let mut compute_units = Vec::new();

        for domain in &domains {
            mem_ranges.push(domain.range);
            memory_controllers.extend(domain.memory_controllers.iter().cloned());
            local_buses.push(domain.local_bus.clone());
            l2_buses.push(domain.l2_bus.clone());
            l2_caches.push(domain.l2_cache.clone());
            downward_filters.push(domain.downward_filter.clone());
            upward_filters.push(domain.upward_filter.clone());
            compute_units.extend(domain.compute_units.iter().cloned());
        }

        tracing::debug!(
            mem_ranges = mem_ranges.len(),
            compute_units = compute_units.len(),
            "assembled system collections"
        );

        NumaSystem {
            base: self.base,
            boot: self.boot,
            mem_ranges,
            memory_controllers,
            local_buses,
            l2_buses,
            l2_caches,
            downward_filters,
            upward_filters,
            compute_units,
            domains,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_system;
    use crate::config::NumaConfigBuilder;
    use crate::types::MIB;

    #[test]
    fn test_mem_ranges_base_first_then_domains() {
        let base = AddrRange::new(0x1_0000_0000, 0x1_0400_0000);
        let config = NumaConfigBuilder::new()
            .num_domains(3)
            .add_base_range(base)
            .build()
            .unwrap();
        let system = build_system(&config).unwrap();

        assert_eq!(
            system.mem_ranges,
            vec![
                base,
                AddrRange::new(0, 512 * MIB),
                AddrRange::new(512 * MIB, 1024 * MIB),
                AddrRange::new(1024 * MIB, 1536 * MIB),
            ]
        );
    }

    #[test]
    fn test_collections_in_domain_order() {
        let config = NumaConfigBuilder::new().num_domains(4).build().unwrap();
        let system = build_system(&config).unwrap();

        let bus_names: Vec<_> = system.local_buses.iter().map(|b| b.desc.name.as_str()).collect();
        assert_eq!(
            bus_names,
            vec!["domain0.membus", "domain1.membus", "domain2.membus", "domain3.membus"]
        );

        for (id, filter) in system.upward_filters.iter().enumerate() {
            assert_eq!(filter.address_ranges, vec![system.domains()[id].range]);
        }
        for (id, mem) in system.memory_controllers.iter().enumerate() {
            assert_eq!(Some(mem.range), system.domain_range(id as DomainId));
        }
        assert_eq!(system.downward_filters.len(), 4);

        let l2_names: Vec<_> = system.l2_caches.iter().map(|c| c.desc.name.as_str()).collect();
        assert_eq!(
            l2_names,
            vec!["domain0.l2", "domain1.l2", "domain2.l2", "domain3.l2"]
        );
        for (bus, domain) in system.l2_buses.iter().zip(system.domains()) {
            assert_eq!(bus, &domain.l2_bus);
            assert_eq!(bus.desc.name, format!("domain{}.tol2bus", domain.id));
        }
    }

    #[test]
    fn test_assembler_sorts_domains() {
        let config = NumaConfigBuilder::new().num_domains(3).build().unwrap();
        let system = build_system(&config).unwrap();

        let mut shuffled = system.domains().to_vec();
        shuffled.reverse();
        let reassembled = SystemAssembler::new(system.base.clone(), BootParams::default())
            .assemble(shuffled);

        assert_eq!(reassembled.mem_ranges, system.mem_ranges);
        assert_eq!(reassembled.compute_units, system.compute_units);
    }

    #[test]
    fn test_component_listing() {
        let system = build_system(&NumaConfigBuilder::new().build().unwrap()).unwrap();

        // 3 base + per domain: membus, tol2bus, l2, 2 cpus, 1 mem ctrl, 2 filters
        let components = system.components();
        assert_eq!(components.len(), 3 + 2 * 8);

        let mut ids: Vec<_> = components.iter().map(|c| c.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), components.len());
        assert_eq!(components[0].name(), "systembus");
    }
}
