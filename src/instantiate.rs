//! Typed instantiation of registry classes.
//!
//! The [`Instantiator`] allocates component ids sequentially for one build
//! and turns registry descriptions into typed components, checking that each
//! class provides the kind of component the caller asked for.
//!
//! A factory only contributes attributes: the id, class and instance name of
//! every description are fixed by the instantiator.

use crate::component::{
    Bus, Cache, ClockDomain, ComponentDesc, ComponentKind, ComputeUnit, MemoryController, Port,
    RoutingFilter,
};
use crate::error::{TopologyError, TopologyResult};
use crate::range::AddrRange;
use crate::registry::{ComponentRegistry, FILTER_CLASS, L2_CACHE_CLASS};
use crate::types::{ComponentId, CpuId, DomainId};

/// Creates components for a single topology build.
#[derive(Debug)]
pub struct Instantiator<'a> {
    registry: &'a ComponentRegistry,
    next_id: ComponentId,
}

impl<'a> Instantiator<'a> {
    pub fn new(registry: &'a ComponentRegistry) -> Self {
        Self {
            registry,
            next_id: 0,
        }
    }

    /// Number of components created so far.
    pub fn created(&self) -> u64 {
        self.next_id
    }

    fn describe(
        &mut self,
        class: &str,
        expected: ComponentKind,
        name: &str,
    ) -> TopologyResult<ComponentDesc> {
        let found = self
            .registry
            .kind_of(class)
            .ok_or_else(|| TopologyError::UnknownClass {
                kind: expected,
                class: class.to_string(),
            })?;
        if found != expected {
            return Err(TopologyError::ClassKindMismatch {
                class: class.to_string(),
                expected,
                found,
            });
        }

        let id = self.next_id;
        let mut desc = self
            .registry
            .create(class, id, name)
            .ok_or_else(|| TopologyError::UnknownClass {
                kind: expected,
                class: class.to_string(),
            })?;
        if desc.kind != expected {
            return Err(TopologyError::ClassKindMismatch {
                class: class.to_string(),
                expected,
                found: desc.kind,
            });
        }
        desc.id = id;
        desc.class = class.to_string();
        desc.name = name.to_string();
        self.next_id += 1;

        tracing::trace!(id, class, name, "instantiated {}", expected);
        Ok(desc)
    }

    /// Creates a bus of the given class on the system clock.
    pub fn bus(&mut self, class: &str, name: &str) -> TopologyResult<Bus> {
        self.bus_in(class, name, ClockDomain::System)
    }

    /// Creates a bus of the given class in `clock`.
    pub fn bus_in(&mut self, class: &str, name: &str, clock: ClockDomain) -> TopologyResult<Bus> {
        let desc = self.describe(class, ComponentKind::Bus, name)?;
        Ok(Bus::new(desc.with_clock(clock)))
    }

    /// Creates an L2 cache on the CPU clock between `upstream` and `downstream`.
    pub fn l2_cache(
        &mut self,
        name: &str,
        upstream: Port,
        downstream: Port,
    ) -> TopologyResult<Cache> {
        let desc = self
            .describe(L2_CACHE_CLASS, ComponentKind::Cache, name)?
            .with_clock(ClockDomain::Cpu);
        Ok(Cache {
            desc,
            upstream,
            downstream,
        })
    }

    /// Creates a range-gated filter bridging `upstream` to `downstream`.
    pub fn filter(
        &mut self,
        name: &str,
        address_ranges: Vec<AddrRange>,
        upstream: Port,
        downstream: Port,
    ) -> TopologyResult<RoutingFilter> {
        let desc = self
            .describe(FILTER_CLASS, ComponentKind::RoutingFilter, name)?
            .with_attr("ranges", address_ranges.len());
        Ok(RoutingFilter {
            desc,
            address_ranges,
            upstream,
            downstream,
        })
    }

    /// Creates a compute unit on the CPU clock, bound to `domain` and issuing
    /// into `port`.
    pub fn compute_unit(
        &mut self,
        class: &str,
        name: &str,
        cpu_id: CpuId,
        domain: DomainId,
        port: Port,
    ) -> TopologyResult<ComputeUnit> {
        let desc = self
            .describe(class, ComponentKind::ComputeUnit, name)?
            .with_clock(ClockDomain::Cpu)
            .with_attr("cpu_id", cpu_id)
            .with_attr("domain", domain);
        Ok(ComputeUnit {
            desc,
            cpu_id,
            domain,
            port,
        })
    }

    /// Creates a memory controller serving `range` on `port`.
    pub fn memory_controller(
        &mut self,
        class: &str,
        name: &str,
        range: AddrRange,
        port: Port,
    ) -> TopologyResult<MemoryController> {
        let desc = self
            .describe(class, ComponentKind::MemoryController, name)?
            .with_attr("range", range);
        Ok(MemoryController { desc, range, port })
    }
}
