//! The base machine the NUMA domains are attached to.
//!
//! Only Alpha full systems can be built. The base system owns the backbone
//! (`systembus`), the I/O bus, the I/O cache joining the two, the bridge
//! ranges, the two clock domains and the memory ranges declared before the
//! domains (by default `[0, mem_size)`).

use serde::{Deserialize, Serialize};

use crate::component::{Bus, RoutingFilter};
use crate::config::{NumaConfig, TargetIsa};
use crate::error::{TopologyError, TopologyResult};
use crate::instantiate::Instantiator;
use crate::range::AddrRange;
use crate::registry::{IO_BUS_CLASS, SYSTEM_BUS_CLASS};

/// The only target a full system can be built for.
pub const SUPPORTED_TARGET: TargetIsa = TargetIsa::Alpha;

/// Fails unless `isa` is the supported target.
pub fn check_target(isa: TargetIsa) -> TopologyResult<()> {
    if isa == SUPPORTED_TARGET {
        Ok(())
    } else {
        Err(TopologyError::UnsupportedTarget(isa))
    }
}

/// Pre-existing system skeleton shared by all domains.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseSystem {
    pub target_isa: TargetIsa,
    pub cache_line_size: u32,
    /// Frequency of the system clock domain
    pub sys_clock: String,
    /// Frequency of the CPU clock domain
    pub cpu_clock: String,
    /// Shared backbone every domain filter connects to
    pub system_bus: Bus,
    pub io_bus: Bus,
    /// I/O bus → backbone, matching the base memory ranges
    pub io_cache: RoutingFilter,
    /// Memory ranges declared before any domain range
    pub mem_ranges: Vec<AddrRange>,
    /// Globally reserved I/O ranges, reachable only via the backbone
    pub bridge_ranges: Vec<AddrRange>,
}

impl BaseSystem {
    /// Builds the base system, aborting on an unsupported target.
    pub fn build(config: &NumaConfig, inst: &mut Instantiator<'_>) -> TopologyResult<Self> {
        check_target(config.system.target_isa)?;

        let system_bus = inst.bus(SYSTEM_BUS_CLASS, "systembus")?;
        let io_bus = inst.bus(IO_BUS_CLASS, "iobus")?;

        // The I/O cache only covers ranges that exist before the domains are
        // appended.
        let mem_ranges = config.base.resolved_mem_ranges();
        let io_cache = inst.filter(
            "iocache",
            mem_ranges.clone(),
            io_bus.master(),
            system_bus.slave(),
        )?;

        tracing::debug!(
            isa = %config.system.target_isa,
            base_ranges = mem_ranges.len(),
            bridge_ranges = config.base.bridge_ranges.len(),
            "built base system"
        );

        Ok(Self {
            target_isa: config.system.target_isa,
            cache_line_size: config.system.cache_line_size,
            sys_clock: config.system.sys_clock.clone(),
            cpu_clock: config.system.cpu_clock.clone(),
            system_bus,
            io_bus,
            io_cache,
            mem_ranges,
            bridge_ranges: config.base.bridge_ranges.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NumaConfigBuilder;
    use crate::registry::create_default_registry;
    use crate::types::MIB;

    #[test]
    fn test_check_target() {
        assert!(check_target(TargetIsa::Alpha).is_ok());
        for isa in [TargetIsa::Arm, TargetIsa::X86, TargetIsa::Riscv] {
            assert!(matches!(
                check_target(isa),
                Err(TopologyError::UnsupportedTarget(found)) if found == isa
            ));
        }
    }

    #[test]
    fn test_build_base_system() {
        let config = NumaConfigBuilder::new()
            .add_base_range(AddrRange::new(0, 64 * MIB))
            .build()
            .unwrap();
        let registry = create_default_registry();
        let mut inst = Instantiator::new(&registry);

        let base = BaseSystem::build(&config, &mut inst).unwrap();
        assert_eq!(base.system_bus.desc.name, "systembus");
        assert_eq!(base.io_bus.desc.class, "IOXBar");
        assert_eq!(base.io_cache.address_ranges, vec![AddrRange::new(0, 64 * MIB)]);
        assert_eq!(base.io_cache.upstream, base.io_bus.master());
        assert_eq!(base.io_cache.downstream, base.system_bus.slave());
        assert_eq!(base.bridge_ranges, config.base.bridge_ranges);
        assert_eq!(base.cache_line_size, 64);
    }

    #[test]
    fn test_default_io_cache_covers_base_memory() {
        let config = NumaConfigBuilder::new().build().unwrap();
        let registry = create_default_registry();
        let mut inst = Instantiator::new(&registry);

        let base = BaseSystem::build(&config, &mut inst).unwrap();
        assert_eq!(base.mem_ranges, vec![AddrRange::new(0, 512 * MIB)]);
        assert_eq!(base.io_cache.address_ranges, base.mem_ranges);
        assert!(base.io_cache.matches(0));
        assert!(!base.io_cache.matches(512 * MIB));
        assert_eq!(base.sys_clock, "1GHz");
        assert_eq!(base.cpu_clock, "2GHz");
        assert_eq!(base.io_cache.desc.clock, crate::component::ClockDomain::System);
    }

    #[test]
    fn test_build_rejects_other_targets() {
        let config = NumaConfigBuilder::new()
            .target_isa(TargetIsa::Arm)
            .build()
            .unwrap();
        let registry = create_default_registry();
        let mut inst = Instantiator::new(&registry);

        let result = BaseSystem::build(&config, &mut inst);
        assert!(matches!(
            result,
            Err(TopologyError::UnsupportedTarget(TargetIsa::Arm))
        ));
        assert_eq!(inst.created(), 0);
    }
}
