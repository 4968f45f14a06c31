//! Xiangqi (Chinese chess) rule engine (C1, spec.md §4.1). Pure functions
//! over a 10×9 board; no I/O.

use crate::protocol::XiangqiMove as WireMove;

pub const ROWS: i32 = 10;
pub const COLS: i32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

impl Color {
    pub const fn opponent(self) -> Self {
        match self {
            Self::Red => Self::Black,
            Self::Black => Self::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceKind {
    King,
    Advisor,
    Elephant,
    Horse,
    Rook,
    Cannon,
    Pawn,
}

impl PieceKind {
    pub const fn code(self) -> char {
        match self {
            Self::King => 'K',
            Self::Advisor => 'A',
            Self::Elephant => 'E',
            Self::Horse => 'H',
            Self::Rook => 'R',
            Self::Cannon => 'C',
            Self::Pawn => 'P',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
    pub r: i32,
    pub c: i32,
}

impl Pos {
    pub const fn new(r: i32, c: i32) -> Self {
        Self { r, c }
    }

    pub const fn in_bounds(self) -> bool {
        self.r >= 0 && self.r < ROWS && self.c >= 0 && self.c < COLS
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Move {
    pub from: Pos,
    pub to: Pos,
    pub piece: Piece,
    pub capture: Option<Piece>,
}

/// `r, c` in `[0,10)×[0,9)`, validated before engine consultation per
/// spec.md §8's boundary-behavior rule.
pub fn in_bounds(r: i32, c: i32) -> bool {
    Pos::new(r, c).in_bounds()
}

const fn in_palace(pos: Pos, color: Color) -> bool {
    if pos.c < 3 || pos.c > 5 {
        return false;
    }
    match color {
        Color::Red => pos.r >= 7 && pos.r <= 9,
        Color::Black => pos.r >= 0 && pos.r <= 2,
    }
}

/// True when `pos` is still on `color`'s own side of the river.
const fn own_side(pos: Pos, color: Color) -> bool {
    match color {
        Color::Red => pos.r >= 5,
        Color::Black => pos.r <= 4,
    }
}

#[derive(Debug, Clone)]
pub struct Board {
    cells: [[Option<Piece>; COLS as usize]; ROWS as usize],
}

impl Board {
    pub fn empty() -> Self {
        Self {
            cells: [[None; COLS as usize]; ROWS as usize],
        }
    }

    pub fn initial() -> Self {
        let mut b = Self::empty();
        let back_rank: [PieceKind; 9] = [
            PieceKind::Rook,
            PieceKind::Horse,
            PieceKind::Elephant,
            PieceKind::Advisor,
            PieceKind::King,
            PieceKind::Advisor,
            PieceKind::Elephant,
            PieceKind::Horse,
            PieceKind::Rook,
        ];

        for (c, kind) in back_rank.into_iter().enumerate() {
            b.set(
                Pos::new(9, c as i32),
                Some(Piece {
                    kind,
                    color: Color::Red,
                }),
            );
            b.set(
                Pos::new(0, c as i32),
                Some(Piece {
                    kind,
                    color: Color::Black,
                }),
            );
        }
        for c in [1, 7] {
            b.set(
                Pos::new(7, c),
                Some(Piece {
                    kind: PieceKind::Cannon,
                    color: Color::Red,
                }),
            );
            b.set(
                Pos::new(2, c),
                Some(Piece {
                    kind: PieceKind::Cannon,
                    color: Color::Black,
                }),
            );
        }
        for c in [0, 2, 4, 6, 8] {
            b.set(
                Pos::new(6, c),
                Some(Piece {
                    kind: PieceKind::Pawn,
                    color: Color::Red,
                }),
            );
            b.set(
                Pos::new(3, c),
                Some(Piece {
                    kind: PieceKind::Pawn,
                    color: Color::Black,
                }),
            );
        }
        b
    }

    pub fn get(&self, pos: Pos) -> Option<Piece> {
        if !pos.in_bounds() {
            return None;
        }
        self.cells[pos.r as usize][pos.c as usize]
    }

    pub fn set(&mut self, pos: Pos, piece: Option<Piece>) {
        self.cells[pos.r as usize][pos.c as usize] = piece;
    }

    pub fn king_pos(&self, color: Color) -> Option<Pos> {
        for r in 0..ROWS {
            for c in 0..COLS {
                let pos = Pos::new(r, c);
                if let Some(p) = self.get(pos) {
                    if p.kind == PieceKind::King && p.color == color {
                        return Some(pos);
                    }
                }
            }
        }
        None
    }

    /// All pseudo-legal moves for `color` (no king-safety filtering).
    pub fn pseudo_legal_moves_for(&self, color: Color) -> Vec<Move> {
        let mut moves = Vec::new();
        for r in 0..ROWS {
            for c in 0..COLS {
                let pos = Pos::new(r, c);
                if let Some(piece) = self.get(pos) {
                    if piece.color == color {
                        self.pseudo_legal_from(pos, piece, &mut moves);
                    }
                }
            }
        }
        moves
    }

    fn push_if_open(&self, from: Pos, to: Pos, piece: Piece, out: &mut Vec<Move>) -> bool {
        if !to.in_bounds() {
            return false;
        }
        match self.get(to) {
            None => {
                out.push(Move {
                    from,
                    to,
                    piece,
                    capture: None,
                });
                true
            }
            Some(occupant) if occupant.color != piece.color => {
                out.push(Move {
                    from,
                    to,
                    piece,
                    capture: Some(occupant),
                });
                false
            }
            Some(_) => false,
        }
    }

    fn pseudo_legal_from(&self, pos: Pos, piece: Piece, out: &mut Vec<Move>) {
        match piece.kind {
            PieceKind::Rook => self.slide(pos, piece, &[(1, 0), (-1, 0), (0, 1), (0, -1)], out),
            PieceKind::Cannon => self.cannon_moves(pos, piece, out),
            PieceKind::Horse => self.horse_moves(pos, piece, out),
            PieceKind::Elephant => self.elephant_moves(pos, piece, out),
            PieceKind::Advisor => self.advisor_moves(pos, piece, out),
            PieceKind::King => self.king_moves(pos, piece, out),
            PieceKind::Pawn => self.pawn_moves(pos, piece, out),
        }
    }

    fn slide(&self, pos: Pos, piece: Piece, directions: &[(i32, i32)], out: &mut Vec<Move>) {
        for &(dr, dc) in directions {
            let mut to = Pos::new(pos.r + dr, pos.c + dc);
            while to.in_bounds() {
                let stop = !self.push_if_open(pos, to, piece, out);
                if stop {
                    break;
                }
                to = Pos::new(to.r + dr, to.c + dc);
            }
        }
    }

    fn cannon_moves(&self, pos: Pos, piece: Piece, out: &mut Vec<Move>) {
        for &(dr, dc) in &[(1, 0), (-1, 0), (0, 1), (0, -1)] {
            let mut to = Pos::new(pos.r + dr, pos.c + dc);
            // Before the screen: only non-capturing slides onto empty squares.
            while to.in_bounds() && self.get(to).is_none() {
                out.push(Move {
                    from: pos,
                    to,
                    piece,
                    capture: None,
                });
                to = Pos::new(to.r + dr, to.c + dc);
            }
            if !to.in_bounds() {
                continue;
            }
            // `to` is the screen (any piece, friend or foe). Continue past it
            // looking for the first piece to land a capture on.
            let mut beyond = Pos::new(to.r + dr, to.c + dc);
            while beyond.in_bounds() {
                if let Some(occupant) = self.get(beyond) {
                    if occupant.color != piece.color {
                        out.push(Move {
                            from: pos,
                            to: beyond,
                            piece,
                            capture: Some(occupant),
                        });
                    }
                    break;
                }
                beyond = Pos::new(beyond.r + dr, beyond.c + dc);
            }
        }
    }

    fn horse_moves(&self, pos: Pos, piece: Piece, out: &mut Vec<Move>) {
        const DELTAS: [(i32, i32); 8] = [
            (-2, -1),
            (-2, 1),
            (2, -1),
            (2, 1),
            (-1, -2),
            (1, -2),
            (-1, 2),
            (1, 2),
        ];
        for (dr, dc) in DELTAS {
            let leg = if dr.abs() == 2 {
                Pos::new(pos.r + dr / 2, pos.c)
            } else {
                Pos::new(pos.r, pos.c + dc / 2)
            };
            if self.get(leg).is_some() {
                continue; // hobbled
            }
            let to = Pos::new(pos.r + dr, pos.c + dc);
            self.push_if_open(pos, to, piece, out);
        }
    }

    fn elephant_moves(&self, pos: Pos, piece: Piece, out: &mut Vec<Move>) {
        for (dr, dc) in [(-2, -2), (-2, 2), (2, -2), (2, 2)] {
            let mid = Pos::new(pos.r + dr / 2, pos.c + dc / 2);
            if self.get(mid).is_some() {
                continue;
            }
            let to = Pos::new(pos.r + dr, pos.c + dc);
            if !to.in_bounds() || !own_side(to, piece.color) {
                continue;
            }
            self.push_if_open(pos, to, piece, out);
        }
    }

    fn advisor_moves(&self, pos: Pos, piece: Piece, out: &mut Vec<Move>) {
        for (dr, dc) in [(-1, -1), (-1, 1), (1, -1), (1, 1)] {
            let to = Pos::new(pos.r + dr, pos.c + dc);
            if !in_palace(to, piece.color) {
                continue;
            }
            self.push_if_open(pos, to, piece, out);
        }
    }

    fn king_moves(&self, pos: Pos, piece: Piece, out: &mut Vec<Move>) {
        for (dr, dc) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
            let to = Pos::new(pos.r + dr, pos.c + dc);
            if !in_palace(to, piece.color) {
                continue;
            }
            self.push_if_open(pos, to, piece, out);
        }
    }

    fn pawn_moves(&self, pos: Pos, piece: Piece, out: &mut Vec<Move>) {
        let forward = match piece.color {
            Color::Red => -1,
            Color::Black => 1,
        };
        self.push_if_open(pos, Pos::new(pos.r + forward, pos.c), piece, out);

        if !own_side(pos, piece.color) {
            self.push_if_open(pos, Pos::new(pos.r, pos.c - 1), piece, out);
            self.push_if_open(pos, Pos::new(pos.r, pos.c + 1), piece, out);
        }
    }

    /// Whether the two kings face each other down an empty file.
    fn flying_general_exposed(&self) -> bool {
        let (Some(red), Some(black)) = (self.king_pos(Color::Red), self.king_pos(Color::Black))
        else {
            return false;
        };
        if red.c != black.c {
            return false;
        }
        let (lo, hi) = if red.r < black.r {
            (red.r, black.r)
        } else {
            (black.r, red.r)
        };
        for r in (lo + 1)..hi {
            if self.get(Pos::new(r, red.c)).is_some() {
                return false;
            }
        }
        true
    }

    /// `isChecked(color)`: flying general exposure, or any enemy piece with a
    /// pseudo-legal move onto `color`'s king square (this naturally includes
    /// cannons, since their pseudo-legal generator already enforces the
    /// single-screen capture rule).
    pub fn is_checked(&self, color: Color) -> bool {
        if self.flying_general_exposed() {
            return true;
        }
        let Some(king) = self.king_pos(color) else {
            return false;
        };
        self.pseudo_legal_moves_for(color.opponent())
            .into_iter()
            .any(|m| m.to == king)
    }

    /// Pseudo-legal moves filtered by `checkSimulate`: apply, test
    /// `is_checked(color)`, undo.
    pub fn legal_moves_for(&self, color: Color) -> Vec<Move> {
        self.pseudo_legal_moves_for(color)
            .into_iter()
            .filter(|m| {
                let mut sim = self.clone();
                sim.apply(m);
                !sim.is_checked(color)
            })
            .collect()
    }

    /// Overwrites the destination, clears the origin. Does not flip turn.
    pub fn apply(&mut self, m: &Move) {
        self.set(m.to, Some(m.piece));
        self.set(m.from, None);
    }
}

/// The mutable engine: a board plus whose turn it is.
#[derive(Debug, Clone)]
pub struct Engine {
    pub board: Board,
    pub turn: Color,
}

impl Engine {
    pub fn initial() -> Self {
        Self {
            board: Board::initial(),
            turn: Color::Red,
        }
    }

    /// Reconstructs engine state by replaying an accepted move list from the
    /// initial position (spec.md §4.1 determinism / §8 round-trip property).
    /// Moves are trusted — they were validated at accept time.
    pub fn replay(moves: &[WireMove]) -> Self {
        let mut engine = Self::initial();
        for wm in moves {
            let from = Pos::new(wm.from.r, wm.from.c);
            let to = Pos::new(wm.to.r, wm.to.c);
            if let Some(piece) = engine.board.get(from) {
                let capture = engine.board.get(to);
                engine.apply_move(&Move {
                    from,
                    to,
                    piece,
                    capture,
                });
            }
        }
        engine
    }

    /// Linear search of `getMoves(turn)`; order-independent by construction.
    pub fn find_legal_move(&self, from: Pos, to: Pos) -> Option<Move> {
        self.board
            .legal_moves_for(self.turn)
            .into_iter()
            .find(|m| m.from == from && m.to == to)
    }

    pub fn apply_move(&mut self, m: &Move) {
        self.board.apply(m);
        self.turn = self.turn.opponent();
    }

    pub fn is_checked(&self, color: Color) -> bool {
        self.board.is_checked(color)
    }

    pub fn legal_moves(&self, color: Color) -> Vec<Move> {
        self.board.legal_moves_for(color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_position_has_legal_moves_for_both_sides() {
        let engine = Engine::initial();
        assert!(!engine.legal_moves(Color::Red).is_empty());
        assert!(!engine.legal_moves(Color::Black).is_empty());
        assert!(!engine.is_checked(Color::Red));
        assert!(!engine.is_checked(Color::Black));
    }

    #[test]
    fn elephant_cannot_cross_river() {
        let mut board = Board::empty();
        board.set(
            Pos::new(5, 2),
            Some(Piece {
                kind: PieceKind::Elephant,
                color: Color::Red,
            }),
        );
        let mut moves = Vec::new();
        board.pseudo_legal_from(
            Pos::new(5, 2),
            Piece {
                kind: PieceKind::Elephant,
                color: Color::Red,
            },
            &mut moves,
        );
        assert!(moves.iter().all(|m| m.to.r >= 5));
    }

    #[test]
    fn cannon_requires_exactly_one_screen_to_capture() {
        let mut board = Board::empty();
        let cannon = Piece {
            kind: PieceKind::Cannon,
            color: Color::Red,
        };
        board.set(Pos::new(5, 0), Some(cannon));
        board.set(
            Pos::new(5, 4),
            Some(Piece {
                kind: PieceKind::Pawn,
                color: Color::Red,
            }),
        );
        board.set(
            Pos::new(5, 8),
            Some(Piece {
                kind: PieceKind::Rook,
                color: Color::Black,
            }),
        );
        let mut moves = Vec::new();
        board.pseudo_legal_from(Pos::new(5, 0), cannon, &mut moves);
        assert!(moves.iter().any(|m| m.to == Pos::new(5, 8) && m.capture.is_some()));
        assert!(!moves.iter().any(|m| m.to == Pos::new(5, 4)));
    }

    #[test]
    fn horse_is_hobbled_by_adjacent_piece() {
        let mut board = Board::empty();
        let horse = Piece {
            kind: PieceKind::Horse,
            color: Color::Red,
        };
        board.set(Pos::new(5, 5), Some(horse));
        board.set(
            Pos::new(4, 5),
            Some(Piece {
                kind: PieceKind::Pawn,
                color: Color::Red,
            }),
        );
        let mut moves = Vec::new();
        board.pseudo_legal_from(Pos::new(5, 5), horse, &mut moves);
        assert!(!moves.iter().any(|m| m.to == Pos::new(3, 4)));
        assert!(!moves.iter().any(|m| m.to == Pos::new(3, 6)));
    }

    #[test]
    fn flying_general_forbids_open_file_faceoff() {
        let mut board = Board::empty();
        board.set(
            Pos::new(9, 4),
            Some(Piece {
                kind: PieceKind::King,
                color: Color::Red,
            }),
        );
        board.set(
            Pos::new(0, 4),
            Some(Piece {
                kind: PieceKind::King,
                color: Color::Black,
            }),
        );
        assert!(board.flying_general_exposed());
        assert!(board.is_checked(Color::Red));
        assert!(board.is_checked(Color::Black));
    }

    #[test]
    fn pinned_elephant_cannot_expose_king_via_capture() {
        // A rook pinning the only blocker to the king; capturing along the
        // pin line with another piece must not be allowed if it exposes check.
        let mut board = Board::empty();
        board.set(
            Pos::new(9, 4),
            Some(Piece {
                kind: PieceKind::King,
                color: Color::Red,
            }),
        );
        board.set(
            Pos::new(0, 4),
            Some(Piece {
                kind: PieceKind::King,
                color: Color::Black,
            }),
        );
        board.set(
            Pos::new(5, 4),
            Some(Piece {
                kind: PieceKind::Cannon,
                color: Color::Red,
            }),
        );
        // Moving the cannon away would expose flying-general check; it must
        // not appear among legal moves.
        let legal = board.legal_moves_for(Color::Red);
        assert!(!legal
            .iter()
            .any(|m| m.from == Pos::new(5, 4) && m.to.c != 4));
    }

    #[test]
    fn replay_reproduces_incremental_application() {
        let mut engine = Engine::initial();
        let m = engine
            .find_legal_move(Pos::new(6, 4), Pos::new(5, 4))
            .expect("central red pawn can advance");
        engine.apply_move(&m);

        let wire_moves = vec![WireMove {
            from: crate::protocol::BoardPos { r: 6, c: 4 },
            to: crate::protocol::BoardPos { r: 5, c: 4 },
            p: 'P',
        }];
        let replayed = Engine::replay(&wire_moves);

        assert_eq!(replayed.turn, engine.turn);
        for r in 0..ROWS {
            for c in 0..COLS {
                assert_eq!(
                    replayed.board.get(Pos::new(r, c)).is_some(),
                    engine.board.get(Pos::new(r, c)).is_some()
                );
            }
        }
    }
}
