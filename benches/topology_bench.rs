//! Benchmarks for topology construction and route resolution.
//!
//! Run with: `cargo bench --bench topology_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use numa_topology::partition::AddressSpacePartitioner;
use numa_topology::types::MIB;
use numa_topology::{
    build_system, create_default_registry, DomainRouterBuilder, NumaConfigBuilder,
    TopologyBuilder, SLICE_SIZE,
};

// ============================================================================
// Build Benchmarks
// ============================================================================

fn bench_build_system(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_system");
    let registry = create_default_registry();

    for num_domains in [1u32, 4, 16, 64].iter() {
        let config = NumaConfigBuilder::new()
            .num_domains(*num_domains)
            .num_cpus_per_domain(4)
            .build()
            .expect("valid benchmark config");

        group.throughput(Throughput::Elements(u64::from(*num_domains)));
        group.bench_with_input(
            BenchmarkId::new("domains", num_domains),
            &config,
            |b, config| {
                b.iter(|| black_box(TopologyBuilder::new(config, &registry).build()));
            },
        );
    }

    group.finish();
}

fn bench_downward_ranges(c: &mut Criterion) {
    let mut group = c.benchmark_group("downward_ranges");

    for num_domains in [4u32, 64, 256].iter() {
        let ranges = AddressSpacePartitioner::new(SLICE_SIZE, 256 * MIB)
            .partition(*num_domains)
            .expect("ranges fit in the address space");
        let router = DomainRouterBuilder::new(&ranges, &[]);

        group.throughput(Throughput::Elements(u64::from(*num_domains)));
        group.bench_with_input(
            BenchmarkId::new("domains", num_domains),
            num_domains,
            |b, &num_domains| {
                b.iter(|| {
                    for id in 0..num_domains {
                        black_box(router.downward_ranges(id));
                    }
                });
            },
        );
    }

    group.finish();
}

// ============================================================================
// Route Benchmarks
// ============================================================================

fn bench_route_resolution(c: &mut Criterion) {
    let config = NumaConfigBuilder::new()
        .num_domains(16)
        .build()
        .expect("valid benchmark config");
    let system = build_system(&config).expect("topology builds");

    c.bench_function("route_all_pairs_16", |b| {
        b.iter(|| {
            for from in 0..16u32 {
                for to in 0..16u64 {
                    black_box(system.route(from, to * SLICE_SIZE + 64));
                }
            }
        });
    });
}

// ============================================================================
// Criterion Groups
// ============================================================================

criterion_group!(
    benches,
    bench_build_system,
    bench_downward_ranges,
    bench_route_resolution,
);

criterion_main!(benches);
