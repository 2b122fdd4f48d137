use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use shoal_core::{Arena, ShoalConfig, UpdateOrder, World};
use std::time::Duration;

fn env_or<T: std::str::FromStr>(name: &str, fallback: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse::<T>().ok())
        .unwrap_or(fallback)
}

fn bench_world_ticks(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_tick");
    let samples: usize = env_or("SHOAL_BENCH_SAMPLES", 30).max(10);
    group.sample_size(samples);
    group.warm_up_time(Duration::from_secs(env_or("SHOAL_BENCH_WARMUP_SECS", 2)));
    group.measurement_time(Duration::from_secs(env_or("SHOAL_BENCH_MEASURE_SECS", 10)));
    // Ticks per bench iteration
    let steps: usize = env_or("SHOAL_BENCH_STEPS", 64).max(1);
    let agent_counts: Vec<usize> = std::env::var("SHOAL_BENCH_AGENTS")
        .ok()
        .map(|s| {
            s.split(',')
                .filter_map(|t| t.trim().parse::<usize>().ok())
                .collect::<Vec<_>>()
        })
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| vec![100_usize, 400, 1000]);

    for order in [UpdateOrder::Interleaved, UpdateOrder::Synchronous] {
        for &agents in &agent_counts {
            let label = format!("{order:?}_steps{steps}_agents{agents}").to_lowercase();
            group.bench_function(label, |b| {
                b.iter_batched(
                    || {
                        let mut config = ShoalConfig {
                            rng_seed: Some(0xBEEF),
                            update_order: order,
                            history_capacity: 1,
                            ..ShoalConfig::default()
                        };
                        config.food.spawn_probability = 0.2;
                        // Dense arena so neighbourhoods stay busy.
                        let mut world =
                            World::new(config, Arena::new(800.0, 800.0)).expect("world");
                        world.populate(agents);
                        world
                    },
                    |mut world| {
                        for _ in 0..steps {
                            world.tick();
                        }
                    },
                    BatchSize::LargeInput,
                );
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_world_ticks);
criterion_main!(benches);
