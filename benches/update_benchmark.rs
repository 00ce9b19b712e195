//! Cost of one learning step and of greedy action selection at the default
//! network size.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array1;
use signal_dqn::agent::DqnAgent;
use signal_dqn::config::DqnConfig;

const STATE_DIM: usize = 20;
const ACTION_DIM: usize = 4;

fn filled_agent() -> DqnAgent {
    let config = DqnConfig::default().buffer_capacity(2_000).seed(0);
    let mut agent = DqnAgent::new(STATE_DIM, ACTION_DIM, config).unwrap();
    for i in 0..2_000 {
        let state = Array1::from_elem(STATE_DIM, (i % 50) as f32 / 50.0);
        let next_state = Array1::from_elem(STATE_DIM, ((i + 1) % 50) as f32 / 50.0);
        agent
            .remember(state, i % ACTION_DIM, -((i % 7) as f32), next_state, i % 100 == 99)
            .unwrap();
    }
    agent
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("dqn_update");
    for &batch_size in &[32usize, 64, 128] {
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            &batch_size,
            |b, &batch_size| {
                let mut agent = filled_agent();
                b.iter(|| agent.update(black_box(batch_size)).unwrap());
            },
        );
    }
    group.finish();
}

fn bench_greedy_action(c: &mut Criterion) {
    let agent = filled_agent();
    let state = Array1::from_elem(STATE_DIM, 0.5);
    c.bench_function("greedy_action", |b| {
        b.iter(|| agent.greedy_action(black_box(state.view())).unwrap());
    });
}

criterion_group!(benches, bench_update, bench_greedy_action);
criterion_main!(benches);
