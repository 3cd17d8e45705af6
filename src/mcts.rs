use crate::action_tree::{ActionTree, TreeReuse};
use crate::board::{Board, GameOutcome, Player};
use crate::mcts_node::{DEFAULT_EXPLORATION_CONSTANT, Reward};
use crate::random::{RandomGenerator, StandardRandomGenerator};
use ego_tree::NodeId;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, trace};

/// Errors returned by the search engine at its boundary with a game driver.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("the game is already over")]
    GameOver,

    #[error("illegal move: {0}")]
    IllegalMove(String),

    #[error("no move can be recommended before the position has been searched")]
    NotSearched,
}

/// Summary of one search call.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchStats {
    /// Simulations run by this call.
    pub simulations: u32,
    pub elapsed: Duration,
    /// Visits of the root after the call, including statistics carried over from earlier moves.
    pub root_visits: u32,
    pub tree_size: usize,
}

/// The main struct for running the Monte Carlo Tree Search algorithm.
///
/// It owns a private copy of the game board, the search tree and the random number generator.
/// A driver searches, asks for the recommended move, and reports every move actually played
/// through [`play`](Self::play) so the engine's board and tree stay in step with the game.
pub struct MonteCarloTreeSearch<T: Board, K: RandomGenerator> {
    board: T,
    tree: ActionTree<T::Move>,
    random: K,
}

impl<T: Board + Default, K: RandomGenerator> Default for MonteCarloTreeSearch<T, K> {
    fn default() -> Self {
        MonteCarloTreeSearchBuilder::new(T::default()).build()
    }
}

/// A builder for creating instances of `MonteCarloTreeSearch`.
pub struct MonteCarloTreeSearchBuilder<T: Board, K: RandomGenerator> {
    board: T,
    random_generator: K,
    exploration: f64,
}

impl<T: Board, K: RandomGenerator> MonteCarloTreeSearchBuilder<T, K> {
    /// Creates a new builder with the given initial board state.
    pub fn new(board: T) -> Self {
        Self {
            board,
            random_generator: K::default(),
            exploration: DEFAULT_EXPLORATION_CONSTANT,
        }
    }

    /// Sets the random number generator for the MCTS search.
    pub fn with_random_generator(mut self, rg: K) -> Self {
        self.random_generator = rg;
        self
    }

    /// Overrides the UCB1 exploration constant (`sqrt(2)` by default).
    pub fn with_exploration_constant(mut self, exploration: f64) -> Self {
        self.exploration = exploration;
        self
    }

    /// Builds the `MonteCarloTreeSearch` instance with the configured parameters.
    pub fn build(self) -> MonteCarloTreeSearch<T, K> {
        MonteCarloTreeSearch::new(self.board, self.random_generator, self.exploration)
    }
}

impl<T: Board, K: RandomGenerator> MonteCarloTreeSearch<T, K> {
    /// Returns a new builder for `MonteCarloTreeSearch`.
    pub fn builder(board: T) -> MonteCarloTreeSearchBuilder<T, K> {
        MonteCarloTreeSearchBuilder::new(board)
    }

    /// Creates a new `MonteCarloTreeSearch` instance with an empty tree.
    ///
    /// It is recommended to use the builder pattern via `MonteCarloTreeSearch::builder()` instead.
    pub fn new(board: T, rg: K, exploration: f64) -> Self {
        Self {
            board,
            tree: ActionTree::new(exploration),
            random: rg,
        }
    }

    /// The engine's copy of the game position.
    pub fn get_board(&self) -> &T {
        &self.board
    }

    /// Returns an immutable reference to the search tree.
    pub fn get_tree(&self) -> &ActionTree<T::Move> {
        &self.tree
    }

    /// Searches until `budget` has elapsed. At least one simulation always runs, even for a
    /// zero budget.
    pub fn search(&mut self, budget: Duration) -> Result<SearchStats, SearchError> {
        self.search_until(Instant::now() + budget)
    }

    /// Searches until `deadline`. The deadline is checked between simulations only, and a
    /// deadline in the past still gets one simulation.
    pub fn search_until(&mut self, deadline: Instant) -> Result<SearchStats, SearchError> {
        self.ensure_in_progress()?;
        let started = Instant::now();
        let mut simulations = 0;
        loop {
            self.do_iteration();
            simulations += 1;
            if Instant::now() >= deadline {
                break;
            }
        }
        Ok(self.finish(simulations, started))
    }

    /// Runs exactly `n` simulations.
    pub fn iterate_n_times(&mut self, n: u32) -> Result<SearchStats, SearchError> {
        self.ensure_in_progress()?;
        let started = Instant::now();
        for _ in 0..n {
            self.do_iteration();
        }
        Ok(self.finish(n, started))
    }

    /// Performs one full iteration: selection, expansion, simulation and backpropagation.
    /// Returns the node the simulation was credited to.
    ///
    /// The engine's board must not be terminal.
    pub fn do_iteration(&mut self) -> NodeId {
        let (node_id, mut board) = self.select_node();
        let mover = board.get_current_player().opponent();
        let outcome = self.simulate(&mut board);
        let reward = Self::reward_for_mover(mover, outcome);
        self.tree.backpropagate(node_id, reward);
        node_id
    }

    /// The move to play: the root child with the most visits.
    pub fn get_most_visited_move(&mut self) -> Result<T::Move, SearchError> {
        self.tree
            .most_visited_child(&mut self.random)
            .ok_or(SearchError::NotSearched)
    }

    /// Commits a move that was played in the real game.
    ///
    /// The engine's board advances, and the tree keeps the subtree below the move if it was
    /// explored or starts over otherwise.
    pub fn play(&mut self, b_move: T::Move) -> Result<TreeReuse, SearchError> {
        self.ensure_in_progress()?;
        if !self.board.get_available_moves().contains(&b_move) {
            return Err(SearchError::IllegalMove(format!("{b_move:?}")));
        }
        self.board.perform_move(b_move);
        let reuse = self.tree.advance(b_move);
        trace!(
            ?b_move,
            ?reuse,
            root_visits = self.tree.root().visits,
            "advanced search tree"
        );
        Ok(reuse)
    }

    fn ensure_in_progress(&self) -> Result<(), SearchError> {
        if self.board.get_outcome().is_terminal() {
            Err(SearchError::GameOver)
        } else {
            Ok(())
        }
    }

    fn finish(&self, simulations: u32, started: Instant) -> SearchStats {
        let stats = SearchStats {
            simulations,
            elapsed: started.elapsed(),
            root_visits: self.tree.root().visits,
            tree_size: self.tree.node_count(),
        };
        debug!(
            simulations = stats.simulations,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            root_visits = stats.root_visits,
            tree_size = stats.tree_size,
            "search finished"
        );
        stats
    }

    /// Descends from the root by UCB1 until it steps into an unvisited node or reaches a leaf.
    /// A reached leaf with a live position is expanded and one new child is picked at random.
    /// Returns the chosen node together with the board at that node.
    fn select_node(&mut self) -> (NodeId, T) {
        let mut board = self.board.clone();
        let mut node_id = self.tree.root_id();

        while let Some(child_id) = self.tree.select_best_child(node_id, &mut self.random) {
            node_id = child_id;
            if let Some(b_move) = self.tree.get(node_id).and_then(|node| node.prev_move) {
                board.perform_move(b_move);
            }
            if self.tree.get(node_id).is_some_and(|node| node.visits == 0) {
                return (node_id, board);
            }
        }

        if board.get_outcome().is_terminal() {
            return (node_id, board);
        }

        let moves = board.get_available_moves();
        let children = self.tree.expand(node_id, &moves);
        trace!(children = children.len(), "expanded node");
        if children.is_empty() {
            return (node_id, board);
        }
        let child_id = *self.random.choose(&children);
        if let Some(b_move) = self.tree.get(child_id).and_then(|node| node.prev_move) {
            board.perform_move(b_move);
        }
        (child_id, board)
    }

    /// Plays uniformly random moves for both sides until the game ends.
    fn simulate(&mut self, board: &mut T) -> GameOutcome {
        let mut outcome = board.get_outcome();
        while outcome == GameOutcome::InProgress {
            let moves = board.get_available_moves();
            if moves.is_empty() {
                return GameOutcome::Draw;
            }
            board.perform_move(*self.random.choose(&moves));
            outcome = board.get_outcome();
        }
        outcome
    }

    /// Reward credited to the node a simulation started from.
    ///
    /// Node statistics are kept from the side of the player who made the node's move, since
    /// that player is the one choosing among the node and its siblings.
    fn reward_for_mover(mover: Player, outcome: GameOutcome) -> Reward {
        match outcome {
            GameOutcome::Won(winner) if winner == mover => Reward::win(),
            GameOutcome::Won(_) => Reward::loss(),
            GameOutcome::Draw | GameOutcome::InProgress => Reward::Draw,
        }
    }
}

impl<T: Board> MonteCarloTreeSearch<T, StandardRandomGenerator> {
    pub fn from_board(board: T) -> Self {
        MonteCarloTreeSearchBuilder::new(board).build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boards::connect_four::ConnectFourBoard;
    use crate::random::CustomNumberGenerator;

    type Engine = MonteCarloTreeSearch<ConnectFourBoard, CustomNumberGenerator>;

    fn engine_at(moves: &[usize]) -> Engine {
        let mut board = ConnectFourBoard::default();
        for &column in moves {
            board.place(column);
        }
        MonteCarloTreeSearch::builder(board)
            .with_random_generator(CustomNumberGenerator::default())
            .build()
    }

    #[test]
    fn zero_budget_runs_exactly_one_simulation() {
        // arrange
        let mut mcts = engine_at(&[]);

        // act
        let stats = mcts.search(Duration::ZERO).unwrap();

        // assert
        assert_eq!(stats.simulations, 1);
        assert_eq!(stats.root_visits, 1);
        let best = mcts.get_most_visited_move().unwrap();
        assert!(mcts.get_board().legal_moves().contains(&best));
    }

    #[test]
    fn past_deadline_still_simulates_once() {
        let mut mcts = engine_at(&[3, 3]);
        let deadline = Instant::now()
            .checked_sub(Duration::from_millis(50))
            .unwrap_or_else(Instant::now);

        let stats = mcts.search_until(deadline).unwrap();

        assert_eq!(stats.simulations, 1);
        assert!(mcts.get_most_visited_move().is_ok());
    }

    #[test]
    fn timed_search_runs_many_simulations() {
        let mut mcts = engine_at(&[]);

        let stats = mcts.search(Duration::from_millis(50)).unwrap();

        assert!(stats.simulations > 1);
        assert_eq!(stats.root_visits, stats.simulations);
        assert!(stats.elapsed >= Duration::from_millis(40));
    }

    #[test]
    fn root_visits_equal_simulation_count() {
        // arrange
        let mut mcts = engine_at(&[]);

        // act
        mcts.iterate_n_times(500).unwrap();

        // assert
        let tree = mcts.get_tree();
        assert_eq!(tree.root().visits, 500);
        let child_visits: u32 = tree
            .children(tree.root_id())
            .into_iter()
            .map(|id| tree.get(id).unwrap().visits)
            .sum();
        assert_eq!(child_visits, 500);
        assert_eq!(tree.children(tree.root_id()).len(), 7);
    }

    #[test]
    fn first_iteration_credits_a_new_root_child() {
        let mut mcts = engine_at(&[]);

        let node_id = mcts.do_iteration();

        let tree = mcts.get_tree();
        assert_eq!(tree.parent(node_id), Some(tree.root_id()));
        assert_eq!(tree.get(node_id).unwrap().visits, 1);
    }

    #[test]
    fn recommendation_requires_a_search() {
        let mut mcts = engine_at(&[]);
        assert_eq!(mcts.get_most_visited_move(), Err(SearchError::NotSearched));
    }

    #[test]
    fn finds_the_winning_column() {
        // arrange: First has three stacked in column 3 and is to move
        let mut mcts = engine_at(&[3, 6, 3, 6, 3, 0]);

        // act
        mcts.iterate_n_times(2000).unwrap();

        // assert
        assert_eq!(mcts.get_most_visited_move(), Ok(3));
        let tree = mcts.get_tree();
        let winning = tree.child_for_move(tree.root_id(), 3).unwrap();
        assert_eq!(tree.get(winning).unwrap().average_reward(), 1.0);
    }

    #[test]
    fn playing_a_searched_move_reuses_its_subtree() {
        // arrange
        let mut mcts = engine_at(&[]);
        mcts.iterate_n_times(400).unwrap();
        let best = mcts.get_most_visited_move().unwrap();
        let tree = mcts.get_tree();
        let child = tree.child_for_move(tree.root_id(), best).unwrap();
        let expected = tree.get(child).unwrap().clone();

        // act
        let reuse = mcts.play(best).unwrap();

        // assert
        assert_eq!(reuse, TreeReuse::Reused);
        assert_eq!(mcts.get_tree().root(), &expected);
        assert_eq!(mcts.get_board().move_count(), 1);
        assert_eq!(mcts.get_board().column_height(best), 1);

        mcts.iterate_n_times(100).unwrap();
        assert_eq!(mcts.get_tree().root().visits, expected.visits + 100);
    }

    #[test]
    fn playing_an_unexplored_move_resets_the_tree() {
        let mut mcts = engine_at(&[]);

        let reuse = mcts.play(2).unwrap();

        assert_eq!(reuse, TreeReuse::Reset);
        assert_eq!(mcts.get_tree().root().visits, 0);
        assert_eq!(mcts.get_tree().node_count(), 1);
        assert_eq!(mcts.get_board().column_height(2), 1);
    }

    #[test]
    fn rejects_illegal_moves() {
        let mut mcts = engine_at(&[0, 0, 0, 0, 0, 0]);

        assert!(matches!(mcts.play(0), Err(SearchError::IllegalMove(_))));
        assert!(matches!(mcts.play(9), Err(SearchError::IllegalMove(_))));
        assert_eq!(mcts.get_board().move_count(), 6);
    }

    #[test]
    fn vertical_four_ends_the_game() {
        let mut mcts = engine_at(&[]);
        for column in [3, 0, 3, 1, 3, 2] {
            mcts.play(column).unwrap();
            assert!(!mcts.get_board().is_win());
        }

        mcts.play(3).unwrap();

        assert!(mcts.get_board().is_win());
        assert_eq!(
            mcts.get_board().outcome(),
            GameOutcome::Won(Player::First)
        );
        assert_eq!(mcts.play(4), Err(SearchError::GameOver));
        assert_eq!(
            mcts.search(Duration::ZERO).unwrap_err(),
            SearchError::GameOver
        );
    }

    #[test]
    fn self_play_reaches_a_terminal_position() {
        let mut mcts = engine_at(&[]);

        while !mcts.get_board().is_terminal() {
            mcts.iterate_n_times(60).unwrap();
            let column = mcts.get_most_visited_move().unwrap();
            mcts.play(column).unwrap();
        }

        let board = mcts.get_board();
        assert!(board.move_count() <= 42);
        assert!(board.outcome().is_terminal());
        assert_eq!(mcts.iterate_n_times(1), Err(SearchError::GameOver));
    }

    #[test]
    fn reward_is_seen_from_the_node_mover() {
        assert_eq!(
            Engine::reward_for_mover(Player::First, GameOutcome::Won(Player::First)),
            Reward::win()
        );
        assert_eq!(
            Engine::reward_for_mover(Player::First, GameOutcome::Won(Player::Second)),
            Reward::loss()
        );
        assert_eq!(
            Engine::reward_for_mover(Player::Second, GameOutcome::Draw),
            Reward::Draw
        );
    }

    #[test]
    fn builder_sets_exploration_constant() {
        let mcts: Engine = MonteCarloTreeSearch::builder(ConnectFourBoard::default())
            .with_exploration_constant(0.5)
            .build();
        assert_eq!(mcts.get_tree().exploration(), 0.5);
    }
}
