//! Topology construction entry point.
//!
//! [`TopologyBuilder`] runs the whole build as one sequential pass over an
//! explicit configuration value:
//!
//! 1. validate the configuration and resolve the kernel command line;
//! 2. build the base system (fails on an unsupported target);
//! 3. partition the address space across domains;
//! 4. create each domain's local bus, L2 bus and cache, compute units and
//!    memory controller;
//! 5. wire each domain's downward and upward filters;
//! 6. assemble everything into a [`NumaSystem`].
//!
//! # Example
//!
//! ```
//! use numa_topology::builder::build_system;
//! use numa_topology::config::NumaConfig;
//!
//! let system = build_system(&NumaConfig::new()).unwrap();
//! assert_eq!(system.domain_count(), 2);
//! assert_eq!(system.compute_units.len(), 4);
//! ```

use crate::assembly::{BootParams, NumaSystem, SystemAssembler};
use crate::component::{Bus, ClockDomain};
use crate::config::{ConfigError, NumaConfig};
use crate::domain::{cpu_id, Domain};
use crate::error::TopologyResult;
use crate::instantiate::Instantiator;
use crate::partition::{overlapping_pairs, AddressSpacePartitioner};
use crate::range::AddrRange;
use crate::registry::{create_default_registry, ComponentRegistry, L2_BUS_CLASS, SYSTEM_BUS_CLASS};
use crate::router::DomainRouterBuilder;
use crate::system::BaseSystem;
use crate::types::DomainId;

/// Builds a [`NumaSystem`] from a configuration and a component registry.
#[derive(Debug)]
pub struct TopologyBuilder<'a> {
    config: &'a NumaConfig,
    registry: &'a ComponentRegistry,
}

impl<'a> TopologyBuilder<'a> {
    pub fn new(config: &'a NumaConfig, registry: &'a ComponentRegistry) -> Self {
        Self { config, registry }
    }

    /// Runs the build. Any error aborts it; nothing partial is returned.
    pub fn build(&self) -> TopologyResult<NumaSystem> {
        let config = self.config;
        config.validate()?;

        let boot = BootParams {
            kernel: config.boot.kernel.clone(),
            command_line: config.boot.resolve_command_line()?,
            script: config.boot.script.clone(),
            init_param: config.boot.init_param,
            lpae: config.boot.lpae,
            virtualisation: config.boot.virtualisation,
        };

        let mut inst = Instantiator::new(self.registry);
        let base = BaseSystem::build(config, &mut inst)?;

        let partitioner = AddressSpacePartitioner::from_params(&config.numa);
        let ranges = partitioner.partition(config.numa.num_domains)?;
        for (a, b) in overlapping_pairs(&ranges) {
            tracing::warn!(
                "domain {} range {} overlaps domain {} range {}; routing to the overlap is ambiguous",
                a,
                ranges[a],
                b,
                ranges[b]
            );
        }

        let router = DomainRouterBuilder::new(&ranges, &base.bridge_ranges);
        let mut domains = Vec::with_capacity(ranges.len());
        for (id, range) in (0..).zip(ranges.iter().copied()) {
            domains.push(self.build_domain(id, range, &router, &base.system_bus, &mut inst)?);
        }

        let system = SystemAssembler::new(base, boot).assemble(domains);

        tracing::info!(
            domains = system.domain_count(),
            cpus = system.compute_units.len(),
            components = inst.created(),
            "built NUMA topology"
        );
        Ok(system)
    }

    fn build_domain(
        &self,
        id: DomainId,
        range: AddrRange,
        router: &DomainRouterBuilder<'_>,
        backbone: &Bus,
        inst: &mut Instantiator<'_>,
    ) -> TopologyResult<Domain> {
        let system = &self.config.system;
        let cpus_per_domain = self.config.numa.num_cpus_per_domain;
        let prefix = Domain::prefix(id);

        let local_bus = inst.bus(SYSTEM_BUS_CLASS, &format!("{prefix}.membus"))?;
        let l2_bus = inst.bus_in(L2_BUS_CLASS, &format!("{prefix}.tol2bus"), ClockDomain::Cpu)?;
        let l2_cache = inst.l2_cache(&format!("{prefix}.l2"), l2_bus.master(), local_bus.slave())?;

        let compute_units = (0..cpus_per_domain)
            .map(|i| -> TopologyResult<_> {
                let cpu = cpu_id(cpus_per_domain, id, i).ok_or_else(|| {
                    ConfigError::Validation(format!("cpu {i} of domain {id} overflows the cpu id space"))
                })?;
                inst.compute_unit(
                    &system.cpu_type,
                    &format!("{prefix}.cpu{i}"),
                    cpu,
                    id,
                    l2_bus.slave(),
                )
            })
            .collect::<TopologyResult<Vec<_>>>()?;

        let memory_controllers = vec![inst.memory_controller(
            &system.mem_type,
            &format!("{prefix}.mem_ctrl"),
            range,
            local_bus.master(),
        )?];

        let filters = router.build(id, &local_bus, backbone, inst)?;

        tracing::debug!(domain = id, range = %range, cpus = compute_units.len(), "built domain");

        Ok(Domain {
            id,
            range,
            local_bus,
            l2_bus,
            l2_cache,
            compute_units,
            memory_controllers,
            downward_filter: filters.downward,
            upward_filter: filters.upward,
        })
    }
}

/// Builds a system using the default component registry.
pub fn build_system(config: &NumaConfig) -> TopologyResult<NumaSystem> {
    let registry = create_default_registry();
    TopologyBuilder::new(config, &registry).build()
}
