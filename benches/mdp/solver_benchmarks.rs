use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use markov::mdp::Graph;
use markov::{Solver, SolverConfig};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Square gridworld with the goal in the far corner and roughly one pit in
/// ten cells. Every other cell is a slippery decision node.
fn gridworld(size: usize, seed: u64) -> Graph {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let cell = |row: usize, col: usize| format!("r{}c{}", row, col);
    let mut graph = Graph::new();

    for row in 0..size {
        for col in 0..size {
            let name = cell(row, col);
            if row == size - 1 && col == size - 1 {
                graph.set_reward(&name, 1.0);
                continue;
            }
            if rng.gen_bool(0.1) {
                graph.set_reward(&name, -1.0);
                continue;
            }

            let mut neighbours = Vec::with_capacity(4);
            if row > 0 {
                neighbours.push(cell(row - 1, col));
            }
            if row + 1 < size {
                neighbours.push(cell(row + 1, col));
            }
            if col > 0 {
                neighbours.push(cell(row, col - 1));
            }
            if col + 1 < size {
                neighbours.push(cell(row, col + 1));
            }
            graph.add_successors(&name, &neighbours);
            graph.set_probabilities(&name, vec![0.8]);
            graph.set_reward(&name, -0.04);
        }
    }
    graph
}

fn bench_gridworld(c: &mut Criterion) {
    let solver = Solver::new(SolverConfig::default().with_discount_factor(0.95))
        .expect("benchmark config is valid");

    let mut group = c.benchmark_group("gridworld");
    for size in [5, 10, 20] {
        let graph = gridworld(size, 42);
        group.bench_with_input(BenchmarkId::from_parameter(size), &graph, |b, graph| {
            b.iter(|| solver.solve(black_box(graph.clone())))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_gridworld);
criterion_main!(benches);
