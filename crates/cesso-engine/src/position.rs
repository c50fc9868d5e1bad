//! A mutable game position built over the immutable, copy-make `cesso_core::Board`.
//!
//! `cesso_core::Board` is `Copy` and exposes only `make_move(&self) -> Board`; it has
//! no native unmake. `Position` adds perfect-undo make/unmake over that type by keeping
//! a history stack of prior boards, plus a parallel hash history for repetition
//! detection.

use cesso_core::{generate_legal_moves, Board, Color, Move, MoveKind};

/// Classification of a position for rollout and UCI purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    InProgress,
    Checkmate,
    Stalemate,
    ThreefoldRepetition,
    FiftyMoves,
}

/// A mutable chess position with perfect-undo make/unmake and repetition tracking.
pub struct Position {
    current: Board,
    history: Vec<Board>,
    hash_history: Vec<u64>,
}

impl Position {
    /// Build a position from a starting board. The board's own hash seeds the
    /// repetition history.
    pub fn new(board: Board) -> Position {
        Position {
            hash_history: vec![board.hash()],
            current: board,
            history: Vec::new(),
        }
    }

    /// The startpos position.
    pub fn starting() -> Position {
        Position::new(Board::starting_position())
    }

    /// Read-only access to the underlying board.
    #[inline]
    pub fn board(&self) -> &Board {
        &self.current
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.current.side_to_move()
    }

    #[inline]
    pub fn hash(&self) -> u64 {
        self.current.hash()
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u16 {
        self.current.halfmove_clock()
    }

    /// Legal moves in the current position.
    pub fn legal_moves(&self) -> cesso_core::MoveList {
        generate_legal_moves(&self.current)
    }

    /// Whether `mv`, played from the current position, captures a piece.
    ///
    /// Must be called before `make_move` — it inspects the pre-move board.
    pub fn is_capture_move(&self, mv: Move) -> bool {
        mv.is_en_passant() || (self.current.is_occupied(mv.dest()) && mv.kind() != MoveKind::Castling)
    }

    /// Whether the side to move is in check.
    pub fn in_check(&self) -> bool {
        let us = self.current.side_to_move();
        self.current
            .is_square_attacked(self.current.king_square(us), us.flip())
    }

    /// Apply `mv`, pushing the pre-move board onto the undo stack.
    pub fn make_move(&mut self, mv: Move) {
        self.history.push(self.current);
        self.current = self.current.make_move(mv);
        self.hash_history.push(self.current.hash());
    }

    /// Undo the most recent `make_move`.
    ///
    /// # Panics
    ///
    /// Panics if called with no prior `make_move` — this indicates a search bug,
    /// since every rollout rewinds exactly as many plies as it descended.
    pub fn unmake_move(&mut self) {
        self.current = self
            .history
            .pop()
            .expect("unmake_move called with empty history");
        self.hash_history.pop();
    }

    /// Number of `make_move` calls currently applied (i.e. ply depth from the
    /// position this `Position` was constructed with).
    #[inline]
    pub fn ply(&self) -> usize {
        self.history.len()
    }

    /// Rewind `plies` half-moves.
    pub fn unmake_n(&mut self, plies: usize) {
        for _ in 0..plies {
            self.unmake_move();
        }
    }

    /// Whether the current position has occurred at least three times
    /// (counting the current occurrence) since this `Position` was built.
    pub fn is_threefold_repetition(&self) -> bool {
        let h = self.current.hash();
        self.hash_history.iter().filter(|&&x| x == h).count() >= 3
    }

    /// Clear the repetition history, keeping only the current position.
    /// Used by `ucinewgame`.
    pub fn reset_history(&mut self) {
        self.history.clear();
        self.hash_history.clear();
        self.hash_history.push(self.current.hash());
    }

    /// Classify the current position.
    pub fn game_state(&self) -> GameState {
        let moves = self.legal_moves();
        if moves.is_empty() {
            return if self.in_check() {
                GameState::Checkmate
            } else {
                GameState::Stalemate
            };
        }
        if self.current.halfmove_clock() >= 100 {
            return GameState::FiftyMoves;
        }
        if self.is_threefold_repetition() {
            return GameState::ThreefoldRepetition;
        }
        GameState::InProgress
    }
}
