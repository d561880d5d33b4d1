//! Component descriptors and the `Component` trait.
//!
//! Components are the handles the topology hands over to the simulation
//! engine: buses, range-gated filters, compute units and memory controllers.
//! Each one carries a [`ComponentDesc`] describing its identity and class,
//! plus the typed connection points the builder wired it with.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::range::{any_contains, AddrRange};
use crate::types::{Addr, ComponentId, CpuId, DomainId};

/// The kind of collaborator a component stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    /// Crossbar with master/slave connection points
    Bus,
    /// Address-range-gated pass-through
    RoutingFilter,
    /// CPU bound to a domain
    ComputeUnit,
    /// Memory controller backing one address range
    MemoryController,
    /// Private cache between a domain's CPUs and its local bus
    Cache,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComponentKind::Bus => "bus",
            ComponentKind::RoutingFilter => "routing filter",
            ComponentKind::ComputeUnit => "compute unit",
            ComponentKind::MemoryController => "memory controller",
            ComponentKind::Cache => "cache",
        };
        f.write_str(name)
    }
}

/// Role of a connection point on its component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortRole {
    /// Bus side that issues requests toward attached slaves
    Master,
    /// Bus side that accepts requests from attached masters
    Slave,
}

/// Clock a component is driven by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockDomain {
    /// System clock shared by buses, filters and memory
    #[default]
    System,
    /// CPU clock driving compute units and their private L2 hierarchy
    Cpu,
}

/// A connection point: a role on a specific component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Port {
    pub component: ComponentId,
    pub role: PortRole,
}

impl Port {
    /// Creates a new port reference.
    pub fn new(component: ComponentId, role: PortRole) -> Self {
        Self { component, role }
    }
}

/// Static description of an instantiated component.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDesc {
    /// Unique identifier for this component
    pub id: ComponentId,
    /// The kind of collaborator
    pub kind: ComponentKind,
    /// Engine class name (e.g. "SystemXBar", "IOCache")
    pub class: String,
    /// Hierarchical instance name (e.g. "domain1.membus")
    pub name: String,
    /// Clock domain the component runs in
    #[serde(default)]
    pub clock: ClockDomain,
    /// Additional attributes as key-value pairs
    pub attrs: BTreeMap<String, String>,
}

impl ComponentDesc {
    /// Creates a new `ComponentDesc`.
    pub fn new(
        id: ComponentId,
        kind: ComponentKind,
        class: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            kind,
            class: class.into(),
            name: name.into(),
            clock: ClockDomain::System,
            attrs: BTreeMap::new(),
        }
    }

    /// Moves the component into another clock domain.
    pub fn with_clock(mut self, clock: ClockDomain) -> Self {
        self.clock = clock;
        self
    }

    /// Adds an attribute to this description.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.attrs.insert(key.into(), value.to_string());
        self
    }
}

/// Common interface of everything the builder instantiates.
pub trait Component {
    /// Identity and class of the component.
    fn desc(&self) -> &ComponentDesc;

    /// Connection points this component exposes or is wired to.
    fn ports(&self) -> Vec<Port>;

    fn id(&self) -> ComponentId {
        self.desc().id
    }

    fn name(&self) -> &str {
        &self.desc().name
    }
}

/// A crossbar offering a master and a slave connection point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bus {
    pub desc: ComponentDesc,
}

impl Bus {
    pub fn new(desc: ComponentDesc) -> Self {
        Self { desc }
    }

    /// The side other components' slave-facing ports connect to.
    pub fn master(&self) -> Port {
        Port::new(self.desc.id, PortRole::Master)
    }

    /// The side other components' master-facing ports connect to.
    pub fn slave(&self) -> Port {
        Port::new(self.desc.id, PortRole::Slave)
    }
}

impl Component for Bus {
    fn desc(&self) -> &ComponentDesc {
        &self.desc
    }

    fn ports(&self) -> Vec<Port> {
        vec![self.master(), self.slave()]
    }
}

/// An address-range-gated pass-through between two connection points.
///
/// Traffic entering at `upstream` is forwarded to `downstream` only when its
/// address falls in one of `address_ranges`. Anything else is not matched;
/// the filter never forwards by default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingFilter {
    pub desc: ComponentDesc,
    /// Ordered ranges this filter matches and forwards
    pub address_ranges: Vec<AddrRange>,
    /// Requester-facing connection (the filter's cpu side)
    pub upstream: Port,
    /// Memory-facing connection (the filter's mem side)
    pub downstream: Port,
}

impl RoutingFilter {
    /// Returns true if traffic to `addr` passes through this filter.
    pub fn matches(&self, addr: Addr) -> bool {
        any_contains(&self.address_ranges, addr)
    }
}

impl Component for RoutingFilter {
    fn desc(&self) -> &ComponentDesc {
        &self.desc
    }

    fn ports(&self) -> Vec<Port> {
        vec![self.upstream, self.downstream]
    }
}

/// A CPU bound to one domain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeUnit {
    pub desc: ComponentDesc,
    /// Global cpu id
    pub cpu_id: CpuId,
    /// Owning domain
    pub domain: DomainId,
    /// L2 bus slave port the unit issues requests into
    pub port: Port,
}

impl Component for ComputeUnit {
    fn desc(&self) -> &ComponentDesc {
        &self.desc
    }

    fn ports(&self) -> Vec<Port> {
        vec![self.port]
    }
}

/// A domain's private L2 cache.
///
/// Sits between the L2 crossbar the domain's CPUs issue into and the local
/// bus; it forwards everything and filters nothing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cache {
    pub desc: ComponentDesc,
    /// L2 bus master port (cpu side)
    pub upstream: Port,
    /// Local bus slave port (mem side)
    pub downstream: Port,
}

impl Component for Cache {
    fn desc(&self) -> &ComponentDesc {
        &self.desc
    }

    fn ports(&self) -> Vec<Port> {
        vec![self.upstream, self.downstream]
    }
}

/// A memory controller backing one address range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryController {
    pub desc: ComponentDesc,
    /// Range served by this controller
    pub range: AddrRange,
    /// Local bus master port the controller answers on
    pub port: Port,
}

impl Component for MemoryController {
    fn desc(&self) -> &ComponentDesc {
        &self.desc
    }

    fn ports(&self) -> Vec<Port> {
        vec![self.port]
    }
}
