//! Connect-Four played by Monte Carlo tree search.
//!
//! The engine grows a search tree with the four classic MCTS phases: UCB1 selection, lazy
//! expansion, uniformly random rollouts and backpropagation. Statistics gathered below the
//! move that is actually played are carried over to the next turn.
//!
//! # Example
//!
//! ```rust
//! use connect4_mcts::boards::connect_four::ConnectFourBoard;
//! use connect4_mcts::mcts::MonteCarloTreeSearch;
//! use connect4_mcts::random::CustomNumberGenerator;
//! use std::time::Duration;
//!
//! // Create an empty board
//! let board = ConnectFourBoard::default();
//!
//! // Create and configure a new MCTS search instance using the builder
//! let mut mcts = MonteCarloTreeSearch::builder(board)
//!     .with_random_generator(CustomNumberGenerator::default())
//!     .build();
//!
//! // Search for a few milliseconds
//! mcts.search(Duration::from_millis(20)).unwrap();
//!
//! // Play the most visited column and keep the explored subtree
//! let column = mcts.get_most_visited_move().unwrap();
//! mcts.play(column).unwrap();
//!
//! println!("The engine played column {}", column + 1);
//! ```

/// Search tree storage, UCB1 selection and the move-commitment protocol.
pub mod action_tree;
/// Contains the `Board` trait and related enums that define the interface for a game.
pub mod board;
/// Game implementations of the `Board` trait.
pub mod boards;
/// The search engine, containing the `MonteCarloTreeSearch` implementation.
pub mod mcts;
/// Contains the `MctsNode` struct and the reward bookkeeping of a tree node.
pub mod mcts_node;
/// Contains traits and implementations for random number generation.
pub mod random;
