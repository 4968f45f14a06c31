//! Property test for spec.md §8's Xiangqi round-trip invariant: replaying the
//! accepted move list from scratch must reproduce the board reached by
//! applying moves incrementally, for arbitrary legal-move walks, not just the
//! fixed example in `engine::xiangqi`'s unit tests.

use proptest::prelude::*;
use room_server::engine::xiangqi::{Color, Engine, Move, Pos};
use room_server::protocol::{BoardPos, XiangqiMove as WireMove};

fn wire_move(m: &Move) -> WireMove {
    WireMove {
        from: BoardPos { r: m.from.r, c: m.from.c },
        to: BoardPos { r: m.to.r, c: m.to.c },
        p: m.piece.kind.code(),
    }
}

/// Walks up to `steps` plies, at each step picking the `choice`-th legal move
/// (modulo the count available), recording both the incremental engine and
/// the wire move list. Stops early if a side has no legal moves (checkmate
/// or stalemate) since there is nothing further to replay.
fn walk(choices: &[u32], steps: usize) -> (Engine, Vec<WireMove>) {
    let mut engine = Engine::initial();
    let mut moves = Vec::new();

    for i in 0..steps.min(choices.len()) {
        let legal = engine.legal_moves(engine.turn);
        if legal.is_empty() {
            break;
        }
        let pick = legal[(choices[i] as usize) % legal.len()];
        moves.push(wire_move(&pick));
        engine.apply_move(&pick);
    }

    (engine, moves)
}

proptest! {
    #[test]
    fn replay_matches_incremental_application(choices in prop::collection::vec(0u32..64, 1..12)) {
        let (incremental, moves) = walk(&choices, choices.len());
        let replayed = Engine::replay(&moves);

        prop_assert_eq!(replayed.turn as u8, incremental.turn as u8);
        for r in 0..10 {
            for c in 0..9 {
                let pos = Pos::new(r, c);
                prop_assert_eq!(
                    replayed.board.get(pos).map(|p| (p.kind, p.color as u8)),
                    incremental.board.get(pos).map(|p| (p.kind, p.color as u8))
                );
            }
        }
    }

    #[test]
    fn replay_is_a_fixpoint(choices in prop::collection::vec(0u32..64, 1..12)) {
        let (_incremental, moves) = walk(&choices, choices.len());
        let replayed_once = Engine::replay(&moves);
        let replayed_twice = Engine::replay(&moves);

        prop_assert_eq!(replayed_once.turn as u8, replayed_twice.turn as u8);
        for r in 0..10 {
            for c in 0..9 {
                let pos = Pos::new(r, c);
                prop_assert_eq!(
                    replayed_once.board.get(pos).map(|p| (p.kind, p.color as u8)),
                    replayed_twice.board.get(pos).map(|p| (p.kind, p.color as u8))
                );
            }
        }
    }
}

#[allow(dead_code)]
fn assert_color_is_comparable(_c: Color) {}
