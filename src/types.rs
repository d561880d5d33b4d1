//! Core type definitions for the topology builder.
//!
//! This module defines the fundamental identifiers used throughout the crate.

/// A physical address in the simulated machine's global address space.
pub type Addr = u64;

/// Unique identifier for a NUMA domain.
///
/// Domains are numbered densely from `0` to `num_domains - 1` and the id also
/// fixes the domain's position in every aggregated collection.
pub type DomainId = u32;

/// Global identifier of a compute unit (CPU).
///
/// Compute unit `i` of domain `d` gets `num_cpus_per_domain * d + i`.
pub type CpuId = u32;

/// Unique identifier for an instantiated component (bus, filter, CPU, ...).
///
/// Allocated sequentially by the component registry during a build.
pub type ComponentId = u64;

/// One mebibyte, the unit the engine uses for `MB` memory sizes.
pub const MIB: u64 = 1 << 20;

/// One gibibyte.
pub const GIB: u64 = 1 << 30;
