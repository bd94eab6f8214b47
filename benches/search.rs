use ai_2048_search::engine::{BoardEngine, Move};
use ai_2048_search::game::Game;
use ai_2048_search::search::{Algorithm, SearchAgent, SearchConfig};
use criterion::{criterion_group, criterion_main, Criterion};
use rayon::ThreadPoolBuilder;
use std::hint::black_box;

fn corpus() -> Vec<Game> {
    let mut game = Game::new(4, 4242).unwrap();
    let mut games = vec![game.clone()];
    let seq = [Move::Left, Move::Up, Move::Right, Move::Down];
    for i in 0..48 {
        if game.is_over() { break; }
        if game.commit_move(seq[i % seq.len()]).is_ok() {
            games.push(game.clone());
        }
    }
    games
}

fn bench_branch_evals(c: &mut Criterion) {
    let games = corpus();
    for (name, algorithm) in [("minimax", Algorithm::Minimax), ("expectimax", Algorithm::Expectimax)] {
        let mut agents: Vec<_> = games
            .iter()
            .map(|g| SearchAgent::new(g.clone(), algorithm, SearchConfig::default()).unwrap())
            .collect();
        c.bench_function(&format!("{name}/branch_evals"), |bch| {
            bch.iter(|| {
                let mut acc = 0.0;
                for agent in agents.iter_mut() {
                    for be in agent.branch_evals().unwrap() { if be.legal { acc += be.value; } }
                }
                black_box(acc)
            })
        });
    }
}

fn bench_e2e(c: &mut Criterion) {
    // Pin a small pool for stability
    let pool = ThreadPoolBuilder::new().num_threads(4).build().unwrap();
    for (name, parallel_root) in [("e2e_seq/32_moves", false), ("e2e_par/32_moves", true)] {
        let cfg = SearchConfig { parallel_root, ..Default::default() };
        c.bench_function(name, |bch| {
            bch.iter(|| pool.install(|| {
                let mut agent = SearchAgent::expectimax(Game::new(4, 13).unwrap(), cfg.clone()).unwrap();
                let mut steps = 0;
                while steps < 32 && agent.choose_and_apply_move().unwrap().direction().is_some() {
                    steps += 1;
                }
                black_box((agent.engine().current_score(), steps))
            }))
        });
    }
}

criterion_group!(search_benches, bench_branch_evals, bench_e2e);
criterion_main!(search_benches);
