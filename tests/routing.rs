//! Route resolution over built topologies.
//!
//! Every domain must reach every other domain's memory exactly once through
//! the backbone, keep its own traffic local, and send bridge traffic out.

use numa_topology::size::ByteSize;
use numa_topology::types::{GIB, MIB};
use numa_topology::{build_system, resolve_route, AddrRange, NumaConfigBuilder, NumaSystem, Route};

fn build(num_domains: u32, per_domain: ByteSize) -> NumaSystem {
    let config = NumaConfigBuilder::new()
        .num_domains(num_domains)
        .mem_size_per_domain(per_domain)
        .build()
        .unwrap();
    build_system(&config).unwrap()
}

#[test]
fn test_every_pair_routes_exactly_once() {
    for n in 1..=6 {
        let system = build(n, ByteSize::mib(512));
        for from in 0..n {
            for to in 0..n {
                let range = system.domain_range(to).unwrap();
                for addr in [range.start, range.start + range.size() / 2, range.end - 1] {
                    let expected = if from == to {
                        Route::Local
                    } else {
                        Route::Remote(to)
                    };
                    assert_eq!(system.route(from, addr), Some(expected), "{from} -> {addr:#x}");
                }
            }
        }
    }
}

#[test]
fn test_local_traffic_never_leaves_domain() {
    let system = build(3, ByteSize::mib(512));
    for domain in system.domains() {
        assert!(!domain.downward_filter.matches(domain.range.start));
        assert!(!domain.downward_filter.matches(domain.range.end - 1));
    }
}

#[test]
fn test_bridge_traffic() {
    let system = build(2, ByteSize::mib(512));
    let io_addr = 0x801_0000_0000;

    assert_eq!(system.route(0, io_addr), Some(Route::Bridge));
    assert_eq!(system.route(1, io_addr), Some(Route::Bridge));
    // No domain accepts bridge traffic from the backbone
    assert!(system.upward_filters.iter().all(|f| !f.matches(io_addr)));

    // The bridge range is half-open: the top byte is left out
    assert_eq!(system.route(0, u64::MAX - 1), Some(Route::Bridge));
    assert_eq!(system.route(0, u64::MAX), Some(Route::Unmapped));
}

#[test]
fn test_single_domain_routes() {
    let system = build(1, ByteSize::mib(512));
    assert_eq!(system.route(0, 0x100), Some(Route::Local));
    assert_eq!(system.route(0, 0x800_0000_0000), Some(Route::Bridge));
    assert_eq!(system.route(0, 600 * MIB), Some(Route::Unmapped));
}

#[test]
fn test_unmapped_gap() {
    // 256MB domains on a 512MB stride leave holes between them
    let system = build(2, ByteSize::mib(256));
    assert_eq!(system.route(0, 300 * MIB), Some(Route::Unmapped));
    assert_eq!(system.route(1, 300 * MIB), Some(Route::Unmapped));
    assert_eq!(system.route(0, 600 * MIB), Some(Route::Remote(1)));
}

#[test]
fn test_unknown_source_domain() {
    let system = build(2, ByteSize::mib(512));
    assert_eq!(system.route(2, 0), None);
    assert_eq!(resolve_route(&[], 0, 0), None);
}

#[test]
fn test_overlap_routes_ambiguously() {
    let system = build(2, ByteSize::gib(1));
    let shared = 768 * MIB;

    assert_eq!(system.route(0, shared), Some(Route::Ambiguous(vec![0, 1])));
    assert_eq!(system.route(1, shared), Some(Route::Ambiguous(vec![0, 1])));

    // Outside the overlap the routes stay unique
    assert_eq!(system.route(0, 0x1000), Some(Route::Local));
    assert_eq!(system.route(0, GIB + MIB), Some(Route::Remote(1)));
    assert_eq!(
        system.domain_range(1),
        Some(AddrRange::new(512 * MIB, 512 * MIB + GIB))
    );
}
