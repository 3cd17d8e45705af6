use crate::board::{Board, GameOutcome, Player};
use crate::random::RandomGenerator;
use std::fmt;
use thiserror::Error;

pub const ROWS: usize = 6;
pub const COLUMNS: usize = 7;

const ALL_COLUMNS_OPEN: u8 = (1 << COLUMNS) - 1;

/// Line directions as (row step, column step): horizontal, vertical and both diagonals.
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// Errors reported by [`ConnectFourBoard::try_place`].
#[derive(Debug, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("column {0} is outside the board")]
    ColumnOutOfRange(usize),

    #[error("column {0} is full")]
    ColumnFull(usize),

    #[error("the game is already over")]
    GameOver,
}

/// A 6×7 Connect-Four grid.
///
/// Row 0 is the bottom row. A move is the index of the column a disc is dropped into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectFourBoard {
    cells: [[Option<Player>; COLUMNS]; ROWS],
    column_heights: [u8; COLUMNS],
    /// Bit `c` is set while column `c` still has room.
    open_columns: u8,
    first_player: Player,
    turn: Player,
    last_move: Option<(usize, usize)>,
    move_count: usize,
}

impl ConnectFourBoard {
    /// Creates an empty board where `first_player` moves first.
    pub fn new(first_player: Player) -> Self {
        Self {
            cells: [[None; COLUMNS]; ROWS],
            column_heights: [0; COLUMNS],
            open_columns: ALL_COLUMNS_OPEN,
            first_player,
            turn: first_player,
            last_move: None,
            move_count: 0,
        }
    }

    /// Creates an empty board with a uniformly chosen starting player.
    pub fn with_random_first_player<K: RandomGenerator>(random: &mut K) -> Self {
        let first = *random.choose(&[Player::First, Player::Second]);
        Self::new(first)
    }

    /// Drops the current player's disc into `column`.
    ///
    /// # Panics
    ///
    /// Panics if the column is not open or the game is already decided. Callers check
    /// [`legal_moves`](Self::legal_moves) and [`is_terminal`](Self::is_terminal) first, or use
    /// [`try_place`](Self::try_place).
    pub fn place(&mut self, column: usize) {
        if let Err(e) = self.check_placement(column) {
            panic!("illegal placement: {e}");
        }
        self.drop_disc(column);
    }

    /// Checked variant of [`place`](Self::place) for moves coming from outside the engine.
    pub fn try_place(&mut self, column: usize) -> Result<(), BoardError> {
        self.check_placement(column)?;
        self.drop_disc(column);
        Ok(())
    }

    fn check_placement(&self, column: usize) -> Result<(), BoardError> {
        if column >= COLUMNS {
            return Err(BoardError::ColumnOutOfRange(column));
        }
        if self.is_terminal() {
            return Err(BoardError::GameOver);
        }
        if !self.is_open(column) {
            return Err(BoardError::ColumnFull(column));
        }
        Ok(())
    }

    fn drop_disc(&mut self, column: usize) {
        let row = self.column_heights[column] as usize;
        self.cells[row][column] = Some(self.turn);
        self.column_heights[column] += 1;
        if self.column_heights[column] as usize == ROWS {
            self.open_columns &= !(1 << column);
        }
        self.last_move = Some((row, column));
        self.move_count += 1;
        self.turn = self.turn.opponent();
    }

    /// Whether the last placed disc completed four in a row.
    ///
    /// Only the lines through the last move are inspected, at most three cells each way.
    pub fn is_win(&self) -> bool {
        let Some((row, column)) = self.last_move else {
            return false;
        };
        let Some(player) = self.cells[row][column] else {
            return false;
        };

        DIRECTIONS.iter().any(|&(dr, dc)| {
            1 + self.run_length(row, column, dr, dc, player)
                + self.run_length(row, column, -dr, -dc, player)
                >= 4
        })
    }

    /// Counts consecutive `player` discs starting next to (row, column), up to three.
    fn run_length(
        &self,
        row: usize,
        column: usize,
        dr: isize,
        dc: isize,
        player: Player,
    ) -> usize {
        let mut count = 0;
        let (mut r, mut c) = (row as isize, column as isize);
        while count < 3 {
            r += dr;
            c += dc;
            if r < 0 || c < 0 || r >= ROWS as isize || c >= COLUMNS as isize {
                break;
            }
            if self.cells[r as usize][c as usize] != Some(player) {
                break;
            }
            count += 1;
        }
        count
    }

    pub fn is_draw(&self) -> bool {
        self.open_columns == 0 && !self.is_win()
    }

    pub fn is_terminal(&self) -> bool {
        self.is_win() || self.is_draw()
    }

    /// The result of the game; [`GameOutcome::InProgress`] until a terminal state.
    pub fn outcome(&self) -> GameOutcome {
        if self.is_win() {
            // The turn has already flipped, so the winner is the previous mover.
            GameOutcome::Won(self.turn.opponent())
        } else if self.open_columns == 0 {
            GameOutcome::Draw
        } else {
            GameOutcome::InProgress
        }
    }

    /// Open columns in ascending order.
    pub fn legal_moves(&self) -> Vec<usize> {
        (0..COLUMNS).filter(|&c| self.is_open(c)).collect()
    }

    /// Picks one open column uniformly. Returns `None` on a full board.
    pub fn random_legal_move<K: RandomGenerator>(&self, random: &mut K) -> Option<usize> {
        let moves = self.legal_moves();
        if moves.is_empty() {
            None
        } else {
            Some(*random.choose(&moves))
        }
    }

    pub fn is_open(&self, column: usize) -> bool {
        column < COLUMNS && self.open_columns & (1 << column) != 0
    }

    /// Contents of a cell; row 0 is the bottom.
    pub fn cell(&self, row: usize, column: usize) -> Option<Player> {
        self.cells[row][column]
    }

    pub fn column_height(&self, column: usize) -> usize {
        self.column_heights[column] as usize
    }

    pub fn current_player(&self) -> Player {
        self.turn
    }

    pub fn first_player(&self) -> Player {
        self.first_player
    }

    /// (row, column) of the most recent placement.
    pub fn last_move(&self) -> Option<(usize, usize)> {
        self.last_move
    }

    pub fn move_count(&self) -> usize {
        self.move_count
    }
}

impl Default for ConnectFourBoard {
    /// Creates an empty board with [`Player::First`] starting.
    fn default() -> Self {
        ConnectFourBoard::new(Player::First)
    }
}

impl Board for ConnectFourBoard {
    type Move = usize;

    fn get_current_player(&self) -> Player {
        self.turn
    }

    fn get_outcome(&self) -> GameOutcome {
        self.outcome()
    }

    fn get_available_moves(&self) -> Vec<Self::Move> {
        if self.is_terminal() {
            return Vec::new();
        }
        self.legal_moves()
    }

    fn perform_move(&mut self, b_move: Self::Move) {
        self.place(b_move);
    }
}

impl fmt::Display for ConnectFourBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..ROWS).rev() {
            for column in 0..COLUMNS {
                let mark = match self.cells[row][column] {
                    None => '.',
                    Some(Player::First) => 'X',
                    Some(Player::Second) => 'O',
                };
                write!(f, "{mark}")?;
                if column + 1 < COLUMNS {
                    write!(f, " ")?;
                }
            }
            writeln!(f)?;
        }
        write!(f, "1 2 3 4 5 6 7")
    }
}
