//! Topology summaries and export.
//!
//! A [`TopologyReport`] is the serializable view of an assembled
//! [`NumaSystem`]: the address map in declared order and, per domain, the
//! ranges its filters forward. It can be exported as JSON, YAML, CSV or a
//! human-readable summary.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

use crate::assembly::NumaSystem;
use crate::config::TargetIsa;
use crate::range::AddrRange;
use crate::types::{CpuId, DomainId};

/// Per-domain routing summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainReport {
    pub id: DomainId,
    pub range: AddrRange,
    pub cpu_ids: Vec<CpuId>,
    /// Ranges the downward filter forwards to the backbone
    pub downward: Vec<AddrRange>,
    /// Ranges the upward filter delivers to the local bus
    pub upward: Vec<AddrRange>,
}

/// Component counts by kind.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentCounts {
    pub buses: usize,
    pub filters: usize,
    pub caches: usize,
    pub compute_units: usize,
    pub memory_controllers: usize,
    pub total: usize,
}

/// Serializable summary of a built topology.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyReport {
    pub target_isa: TargetIsa,
    pub cache_line_size: u32,
    /// Global memory ranges in declared (decode) order
    pub mem_ranges: Vec<AddrRange>,
    pub bridge_ranges: Vec<AddrRange>,
    pub domains: Vec<DomainReport>,
    pub components: ComponentCounts,
}

impl TopologyReport {
    /// Summarizes an assembled system.
    pub fn from_system(system: &NumaSystem) -> Self {
        let domains = system
            .domains()
            .iter()
            .map(|d| DomainReport {
                id: d.id,
                range: d.range,
                cpu_ids: d.cpu_ids(),
                downward: d.downward_filter.address_ranges.clone(),
                upward: d.upward_filter.address_ranges.clone(),
            })
            .collect();

        // Base system contributes the backbone, the I/O bus and the I/O cache.
        let buses = 2 + system.local_buses.len() + system.l2_buses.len();
        let filters = 1 + system.downward_filters.len() + system.upward_filters.len();
        let components = ComponentCounts {
            buses,
            filters,
            caches: system.l2_caches.len(),
            compute_units: system.compute_units.len(),
            memory_controllers: system.memory_controllers.len(),
            total: system.components().len(),
        };

        Self {
            target_isa: system.base.target_isa,
            cache_line_size: system.base.cache_line_size,
            mem_ranges: system.mem_ranges.clone(),
            bridge_ranges: system.base.bridge_ranges.clone(),
            domains,
            components,
        }
    }

    /// Returns the owner label of `mem_ranges[index]`: `base`, `domainN`, or
    /// `unknown` when the trailing ranges do not line up with the domains.
    fn owner_of(&self, index: usize) -> String {
        let base_count = self.mem_ranges.len().saturating_sub(self.domains.len());
        if index < base_count {
            return "base".to_string();
        }
        let domain = self.domains.get(index - base_count);
        match (domain, self.mem_ranges.get(index)) {
            (Some(domain), Some(range)) if domain.range == *range => {
                format!("domain{}", domain.id)
            }
            _ => "unknown".to_string(),
        }
    }

    /// Exports the report to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Exports the report to a JSON file.
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = self
            .to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    /// Exports the report to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Exports the global address map to CSV, one row per memory range in
    /// declared order.
    pub fn address_map_csv(&self) -> String {
        let mut csv = String::new();
        csv.push_str("index,start,end,size,owner\n");

        for (index, range) in self.mem_ranges.iter().enumerate() {
            csv.push_str(&format!(
                "{},{:#x},{:#x},{},{}\n",
                index,
                range.start,
                range.end,
                range.size(),
                self.owner_of(index),
            ));
        }

        csv
    }

    /// Writes the address map CSV to a file.
    pub fn address_map_csv_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        std::fs::write(path, self.address_map_csv())
    }

    /// Writes a human-readable summary to a writer.
    pub fn write_summary<W: Write>(&self, mut w: W) -> std::io::Result<()> {
        writeln!(w, "=== NUMA Topology ===")?;
        writeln!(w, "Target: {}", self.target_isa)?;
        writeln!(w, "Cache line: {} bytes", self.cache_line_size)?;
        writeln!(
            w,
            "Components: {} ({} buses, {} filters, {} caches, {} cpus, {} memories)",
            self.components.total,
            self.components.buses,
            self.components.filters,
            self.components.caches,
            self.components.compute_units,
            self.components.memory_controllers,
        )?;
        writeln!(w)?;

        writeln!(w, "--- Bridge ---")?;
        for range in &self.bridge_ranges {
            writeln!(w, "  {range}")?;
        }
        writeln!(w)?;

        writeln!(w, "--- Domains ---")?;
        for domain in &self.domains {
            writeln!(w, "Domain {} {}:", domain.id, domain.range)?;
            writeln!(w, "  CPUs: {:?}", domain.cpu_ids)?;
            let down: Vec<String> = domain.downward.iter().map(ToString::to_string).collect();
            writeln!(w, "  Downward: {}", down.join(" "))?;
            let up: Vec<String> = domain.upward.iter().map(ToString::to_string).collect();
            writeln!(w, "  Upward: {}", up.join(" "))?;
        }

        Ok(())
    }

    /// Returns the summary as a string.
    pub fn summary(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_summary(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}
