//! Pure game-rule engines (C1): no I/O, no locking, deterministic given
//! board state and a move.

pub mod gomoku;
pub mod xiangqi;
