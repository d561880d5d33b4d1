//! Two-Domain Topology Example
//!
//! Builds the default two-domain Alpha machine and prints:
//! - The topology summary (domain ranges and filter contents)
//! - The global address map in decode order
//! - Where a few sample addresses issued from domain 0 are routed
//!
//! Pass a YAML or JSON configuration path to build something else:
//!
//! ```text
//! cargo run --example two_domains -- topology.yaml
//! ```

use numa_topology::{build_system, init_logging, NumaConfig, TopologyReport};

// ============================================================================
// Sample Addresses
// ============================================================================

const SAMPLES: &[u64] = &[
    0x0000_1000,     // domain 0 memory
    0x2000_0040,     // domain 1 memory
    0x800_0000_0000, // Alpha I/O space
    0x7000_0000,     // past the last domain
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => NumaConfig::from_file(path)?,
        None => NumaConfig::new(),
    };
    init_logging(&config.log_level);

    let system = build_system(&config)?;
    let report = TopologyReport::from_system(&system);

    println!("{}", report.summary());

    println!("=== Address Map ===");
    print!("{}", report.address_map_csv());
    println!();

    println!("=== Routes From Domain 0 ===");
    for &addr in SAMPLES {
        println!("{addr:#014x} -> {:?}", system.route(0, addr));
    }

    Ok(())
}
