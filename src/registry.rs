//! Component factory registry.
//!
//! The registry stands in for the simulation engine's object catalogue: each
//! class name (e.g. `"SystemXBar"`, `"AtomicSimpleCPU"`) maps to the kind of
//! component it provides and a factory that describes new instances. The
//! topology builder only ever instantiates collaborators through it, so the
//! CPU and memory models are chosen by configuration rather than hard-coded.
//!
//! # Example
//!
//! ```
//! use numa_topology::component::{ComponentDesc, ComponentKind};
//! use numa_topology::registry::ComponentRegistry;
//!
//! let mut registry = ComponentRegistry::new();
//! registry.register("MyCPU", ComponentKind::ComputeUnit, |id, name| {
//!     ComponentDesc::new(id, ComponentKind::ComputeUnit, "MyCPU", name).with_attr("width", 4)
//! });
//!
//! let desc = registry.create("MyCPU", 1, "domain0.cpu0").unwrap();
//! assert_eq!(desc.attrs["width"], "4");
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::component::{ComponentDesc, ComponentKind};
use crate::types::ComponentId;

/// Type alias for component factory functions.
pub type ComponentFactory = Arc<dyn Fn(ComponentId, &str) -> ComponentDesc + Send + Sync>;

struct ClassEntry {
    kind: ComponentKind,
    factory: ComponentFactory,
}

/// A registry of component classes.
#[derive(Default)]
pub struct ComponentRegistry {
    classes: HashMap<String, ClassEntry>,
}

impl ComponentRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a component class with the given name and kind.
    ///
    /// Registering an existing name replaces the previous entry.
    pub fn register<F>(&mut self, class: impl Into<String>, kind: ComponentKind, factory: F)
    where
        F: Fn(ComponentId, &str) -> ComponentDesc + Send + Sync + 'static,
    {
        self.classes.insert(
            class.into(),
            ClassEntry {
                kind,
                factory: Arc::new(factory),
            },
        );
    }

    /// Registers a class whose instances carry no extra attributes.
    pub fn register_plain(&mut self, class: &str, kind: ComponentKind) {
        let class_name = class.to_string();
        self.register(class, kind, move |id, name| {
            ComponentDesc::new(id, kind, class_name.clone(), name)
        });
    }

    /// Creates a component description by class name.
    ///
    /// # Returns
    /// `Some(desc)` if the class is registered, `None` otherwise
    pub fn create(&self, class: &str, id: ComponentId, name: &str) -> Option<ComponentDesc> {
        self.classes.get(class).map(|entry| (entry.factory)(id, name))
    }

    /// Returns the kind of component a class provides.
    pub fn kind_of(&self, class: &str) -> Option<ComponentKind> {
        self.classes.get(class).map(|entry| entry.kind)
    }

    /// Returns true if a class is registered.
    pub fn contains(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    /// Returns the number of registered classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns true if no classes are registered.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Returns an iterator over registered class names.
    pub fn class_names(&self) -> impl Iterator<Item = &String> {
        self.classes.keys()
    }

    /// Unregisters a class.
    pub fn unregister(&mut self, class: &str) -> bool {
        self.classes.remove(class).is_some()
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("registered_classes", &self.classes.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Class of the shared backbone and of every domain's local bus.
pub const SYSTEM_BUS_CLASS: &str = "SystemXBar";
/// Class of the I/O bus.
pub const IO_BUS_CLASS: &str = "IOXBar";
/// Class of every routing filter.
pub const FILTER_CLASS: &str = "IOCache";
/// Class of the crossbar between a domain's CPUs and its L2 cache.
pub const L2_BUS_CLASS: &str = "L2XBar";
/// Class of every domain's L2 cache.
pub const L2_CACHE_CLASS: &str = "L2Cache";

/// Creates a default registry with built-in component classes.
///
/// Includes:
/// - `SystemXBar`, `IOXBar` - buses
/// - `IOCache` - range-gated filter
/// - `L2XBar`, `L2Cache` - per-domain L2 hierarchy
/// - `AtomicSimpleCPU`, `TimingSimpleCPU`, `DerivO3CPU` - compute units
/// - `SimpleMemory`, `DDR3_1600_8x8` - memory controllers
pub fn create_default_registry() -> ComponentRegistry {
    let mut registry = ComponentRegistry::new();

    registry.register_plain(SYSTEM_BUS_CLASS, ComponentKind::Bus);
    registry.register_plain(IO_BUS_CLASS, ComponentKind::Bus);
    registry.register_plain(FILTER_CLASS, ComponentKind::RoutingFilter);
    registry.register_plain(L2_BUS_CLASS, ComponentKind::Bus);
    registry.register(L2_CACHE_CLASS, ComponentKind::Cache, |id, name| {
        ComponentDesc::new(id, ComponentKind::Cache, L2_CACHE_CLASS, name)
            .with_attr("size", "2MB")
            .with_attr("assoc", 8)
    });

    for (class, mem_mode) in [
        ("AtomicSimpleCPU", "atomic"),
        ("TimingSimpleCPU", "timing"),
        ("DerivO3CPU", "timing"),
    ] {
        registry.register(class, ComponentKind::ComputeUnit, move |id, name| {
            ComponentDesc::new(id, ComponentKind::ComputeUnit, class, name)
                .with_attr("mem_mode", mem_mode)
        });
    }

    registry.register_plain("SimpleMemory", ComponentKind::MemoryController);
    registry.register("DDR3_1600_8x8", ComponentKind::MemoryController, |id, name| {
        ComponentDesc::new(id, ComponentKind::MemoryController, "DDR3_1600_8x8", name)
            .with_attr("device_size", "512MB")
            .with_attr("devices_per_rank", 8)
    });

    registry
}
