//! The NUMA domain record.

use serde::{Deserialize, Serialize};

use crate::component::{Bus, Cache, ComputeUnit, MemoryController, RoutingFilter};
use crate::range::AddrRange;
use crate::types::{Addr, CpuId, DomainId};

/// One NUMA node: an address range, a local interconnect, its compute units
/// behind a private L2, its memory, and the two filters joining it to the
/// backbone.
///
/// CPUs issue into `l2_bus`; `l2_cache` joins the L2 bus master to the local
/// bus slave.
///
/// Every field is fixed when the domain is constructed; filters are never
/// reassigned afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub id: DomainId,
    /// Address range owned by this domain
    pub range: AddrRange,
    /// Local interconnect every local unit attaches to
    pub local_bus: Bus,
    /// Crossbar between the compute units and the L2 cache
    pub l2_bus: Bus,
    /// Private L2 cache in front of the local bus
    pub l2_cache: Cache,
    /// Compute units in ascending cpu id order
    pub compute_units: Vec<ComputeUnit>,
    /// Controllers backing `range`
    pub memory_controllers: Vec<MemoryController>,
    /// Local bus → backbone, matching foreign and bridge ranges
    pub downward_filter: RoutingFilter,
    /// Backbone → local bus, matching only `range`
    pub upward_filter: RoutingFilter,
}

impl Domain {
    /// Returns true if `addr` belongs to this domain's memory.
    pub fn owns(&self, addr: Addr) -> bool {
        self.range.contains(addr)
    }

    /// Global cpu ids of this domain's compute units.
    pub fn cpu_ids(&self) -> Vec<CpuId> {
        self.compute_units.iter().map(|cpu| cpu.cpu_id).collect()
    }

    /// Hierarchical instance-name prefix used for this domain's components.
    pub fn prefix(id: DomainId) -> String {
        format!("domain{id}")
    }
}

/// Global cpu id of unit `index` in domain `domain`, or `None` if it does
/// not fit a [`CpuId`].
pub fn cpu_id(cpus_per_domain: u32, domain: DomainId, index: u32) -> Option<CpuId> {
    cpus_per_domain.checked_mul(domain)?.checked_add(index)
}
