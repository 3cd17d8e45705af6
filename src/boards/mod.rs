//! Game implementations of the `Board` trait.

/// The 6×7 Connect-Four board.
pub mod connect_four;
