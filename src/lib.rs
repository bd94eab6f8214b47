//! ai-2048-search: minimax and expectimax move selection for 2048-style merge puzzles
//!
//! This crate provides:
//! - A square `Grid` of any size with the shift/merge rules and the `BoardEngine` trait the
//!   search is written against (`engine` module)
//! - A seeded reference engine, `Game` (`game` module)
//! - Minimax and expectimax agents with a weighted heuristic and a phase-aware depth budget
//!   (`search` module)
//!
//! Quick start:
//! ```
//! use ai_2048_search::game::Game;
//! use ai_2048_search::search::{SearchAgent, SearchConfig};
//!
//! let game = Game::new(4, 42).unwrap();
//! let mut agent = SearchAgent::minimax(game, SearchConfig::default()).unwrap();
//! let decision = agent.choose_and_apply_move().unwrap();
//! assert!(decision.direction().is_some());
//! assert_eq!(agent.engine().moves(), 1);
//! ```
//!
//! Full loop (simplest possible)
//! ```
//! use ai_2048_search::engine::BoardEngine;
//! use ai_2048_search::game::Game;
//! use ai_2048_search::search::{Decision, SearchAgent, SearchConfig};
//!
//! // 1) Seeded game and an expectimax agent on top of it
//! let game = Game::new(4, 123).unwrap();
//! let mut agent = SearchAgent::expectimax(game, SearchConfig::default()).unwrap();
//!
//! // 2) Play a handful of moves (keep doctests fast)
//! let mut moves = 0;
//! while moves < 4 {
//!     match agent.choose_and_apply_move().unwrap() {
//!         Decision::Moved(_) => moves += 1,
//!         Decision::GameOver => break,
//!     }
//! }
//!
//! // 3) Inspect final state
//! let game = agent.into_engine();
//! assert_eq!(game.moves(), moves);
//! let _final_score = game.current_score();
//! ```
//!
pub mod engine;
pub mod game;
pub mod search;
