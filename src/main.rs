use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use ai_2048_search::engine::BoardEngine;
use ai_2048_search::game::Game;
use ai_2048_search::search::{Algorithm, Decision, SearchAgent, SearchConfig};
use anyhow::Context;
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let cfg = args.search_config()?;
    let seed = args.seed.unwrap_or_else(rand::random);

    let game = Game::with_options(args.size, seed, cfg.allow_fours)?;
    let depth = cfg.base_depth;
    let dynamic = cfg.dynamic_depth;
    let mut agent = SearchAgent::new(game, args.algorithm.into(), cfg)?;

    let pb = if args.quiet {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner} {elapsed_precise} | Moves: {pos} | {msg}")?
                .tick_chars("⠁⠃⠇⠧⠷⠿⠻⠟⠯⠷⠧⠇⠃"),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    };

    let start = Instant::now();
    let mut moves: u64 = 0;
    let mut search_time = Duration::ZERO;
    loop {
        if args.max_moves.is_some_and(|limit| moves >= limit) {
            break;
        }
        let report = match agent.choose_and_apply_move()? {
            Decision::Moved(report) => report,
            Decision::GameOver => break,
        };
        moves += 1;
        search_time += report.elapsed;
        if args.print_board {
            let line = format!("{} (depth {}){}", report.direction, report.depth, agent.engine().grid());
            match &pb {
                Some(pb) => pb.println(line),
                None => println!("{}", line),
            }
        }
        if let Some(pb) = &pb {
            pb.set_position(moves);
            pb.set_message(format!("score: {} | depth: {}", report.score, report.depth));
        }
    }
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let game = agent.into_engine();
    let time = start.elapsed().as_secs_f64().max(1e-6);
    let score = game.current_score();
    println!("{}", game);
    println!(
        "Seed: {} | Depth: {} | Dynamic: {} | Time: {:.1} | Search: {:.1} | Score: {} | Moves/sec: {:.2} | Points/sec: {:.2} | Highest Tile: {}",
        seed,
        depth,
        dynamic,
        time,
        search_time.as_secs_f64(),
        score,
        moves as f64 / time,
        score as f64 / time,
        game.highest_tile()
    );
    Ok(())
}

#[derive(Debug, Parser)]
#[command(name = "ai-2048-search", about = "Play one game with a minimax or expectimax agent")]
struct Args {
    /// Search algorithm
    #[arg(long, value_enum, default_value_t = AlgorithmArg::Expectimax)]
    algorithm: AlgorithmArg,

    /// Base search depth in layers (overrides the config file)
    #[arg(long)]
    depth: Option<u32>,

    /// Always search at the base depth instead of adapting to empty cells
    #[arg(long)]
    static_depth: bool,

    /// Board side length
    #[arg(long, default_value_t = 4)]
    size: usize,

    /// RNG seed for tile spawns (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Only spawn 2-tiles
    #[arg(long)]
    no_fours: bool,

    /// Stop after this many moves
    #[arg(long)]
    max_moves: Option<u64>,

    /// Per-move search time budget in milliseconds
    #[arg(long)]
    deadline_ms: Option<u64>,

    /// Evaluate root moves on the rayon thread pool
    #[arg(long)]
    parallel: bool,

    /// JSON file with a search configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the board after every move
    #[arg(long)]
    print_board: bool,

    /// Suppress the spinner status line
    #[arg(long)]
    quiet: bool,
}

impl Args {
    fn search_config(&self) -> anyhow::Result<SearchConfig> {
        let mut cfg = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
            }
            None => SearchConfig::default(),
        };
        if let Some(depth) = self.depth {
            cfg.base_depth = depth;
        }
        if self.static_depth {
            cfg.dynamic_depth = false;
        }
        if self.no_fours {
            cfg.allow_fours = false;
        }
        if self.deadline_ms.is_some() {
            cfg.deadline_ms = self.deadline_ms;
        }
        if self.parallel {
            cfg.parallel_root = true;
        }
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AlgorithmArg {
    Minimax,
    Expectimax,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::Minimax => Algorithm::Minimax,
            AlgorithmArg::Expectimax => Algorithm::Expectimax,
        }
    }
}
