use std::fmt::Debug;

/// The central trait of the library, defining the interface for a game state.
///
/// The search engine only ever talks to the game through this trait: it clones boards to
/// explore hypothetical futures, asks for legal moves and applies them.
pub trait Board: Clone {
    /// The type representing a move in the game. For Connect-Four this is a column index.
    type Move: Copy + PartialEq + Debug;

    /// Returns the player whose turn it is to make a move.
    fn get_current_player(&self) -> Player;

    /// Returns the current outcome of the game.
    fn get_outcome(&self) -> GameOutcome;

    /// Returns a list of all legal moves available from the current state.
    ///
    /// The order carries no meaning but must be stable for a given state.
    fn get_available_moves(&self) -> Vec<Self::Move>;

    /// Applies a given move to the board, modifying its state.
    ///
    /// The move must be one of [`Board::get_available_moves`].
    fn perform_move(&mut self, b_move: Self::Move);
}

/// Represents the possible outcomes of a game.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum GameOutcome {
    /// The game is still ongoing.
    InProgress,
    /// The given player completed a line.
    Won(Player),
    /// The board filled up without a winner.
    Draw,
}

impl GameOutcome {
    pub fn is_terminal(&self) -> bool {
        *self != GameOutcome::InProgress
    }
}

/// The two sides of a two-player game.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum Player {
    First,
    Second,
}

impl Player {
    /// Returns the other side.
    pub fn opponent(self) -> Player {
        match self {
            Player::First => Player::Second,
            Player::Second => Player::First,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opponent_flips_back_and_forth() {
        assert_eq!(Player::First.opponent(), Player::Second);
        assert_eq!(Player::Second.opponent(), Player::First);
        assert_eq!(Player::First.opponent().opponent(), Player::First);
    }

    #[test]
    fn only_in_progress_is_not_terminal() {
        assert!(!GameOutcome::InProgress.is_terminal());
        assert!(GameOutcome::Draw.is_terminal());
        assert!(GameOutcome::Won(Player::Second).is_terminal());
    }
}
