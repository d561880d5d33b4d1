//! # NUMA Topology
//!
//! Builds the multi-domain memory topology of a simulated NUMA machine and
//! hands the wired components to a simulation engine.
//!
//! ## Design Principles
//!
//! - **Partitioned Address Space**: Each domain owns one contiguous range of
//!   the global physical address space, at a fixed stride per domain id.
//! - **Directional Routing**: Every domain is joined to the shared backbone by
//!   two stateless, range-gated filters. The downward filter forwards foreign
//!   and bridge traffic out of the domain; the upward filter delivers only the
//!   domain's own traffic back in.
//! - **Ordered Collections**: All range lists are ordered vectors because the
//!   engine decodes addresses first-match-wins.
//! - **Explicit Configuration**: A [`NumaConfig`] value is threaded through
//!   every step; nothing reads global state.
//!
//! ## Quick Start
//!
//! ```rust
//! use numa_topology::{build_system, NumaConfigBuilder, Route};
//! use numa_topology::size::ByteSize;
//!
//! let config = NumaConfigBuilder::new()
//!     .num_domains(2)
//!     .num_cpus_per_domain(2)
//!     .mem_size_per_domain(ByteSize::mib(512))
//!     .build()
//!     .unwrap();
//!
//! let system = build_system(&config).unwrap();
//!
//! // Domain 0 reaches domain 1's memory through the backbone
//! assert_eq!(system.route(0, 0x2000_0000), Some(Route::Remote(1)));
//! assert_eq!(system.route(0, 0x1000), Some(Route::Local));
//! ```
//!
//! ## Configuration-Driven Setup
//!
//! ```rust,ignore
//! use numa_topology::NumaConfig;
//!
//! let config = NumaConfig::from_yaml_file("topology.yaml")?;
//! numa_topology::init_logging(&config.log_level);
//! let system = numa_topology::build_system(&config)?;
//! ```

pub mod types;
pub mod size;
pub mod range;
pub mod config;
pub mod error;
pub mod component;
pub mod registry;
pub mod instantiate;
pub mod partition;
pub mod domain;
pub mod router;
pub mod system;
pub mod assembly;
pub mod builder;
pub mod report;

// Re-export commonly used types
pub use types::{Addr, ComponentId, CpuId, DomainId};
pub use range::AddrRange;
pub use config::{ConfigError, NumaConfig, NumaConfigBuilder, TargetIsa};
pub use error::{TopologyError, TopologyResult};
pub use component::{Bus, Cache, ClockDomain, Component, ComponentDesc, ComponentKind, ComputeUnit, MemoryController, Port, PortRole, RoutingFilter};
pub use registry::{create_default_registry, ComponentRegistry};
pub use partition::{AddressSpacePartitioner, SLICE_SIZE};
pub use domain::Domain;
pub use router::{resolve_route, DomainRouterBuilder, Route};
pub use system::BaseSystem;
pub use assembly::{NumaSystem, SystemAssembler};
pub use builder::{build_system, TopologyBuilder};
pub use report::TopologyReport;

/// Initialize the tracing subscriber for logging.
///
/// Call this at the start of your program to enable logging.
///
/// # Example
///
/// ```rust,ignore
/// numa_topology::init_logging("info");
/// ```
pub fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
