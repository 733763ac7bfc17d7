//! Move-tree node counting for validating the generator.

use log::trace;

use crate::movegen::{GenOptions, Move};
use crate::position::Position;

impl Position {
    /// Number of leaf nodes of the legal move tree `depth` plies deep.
    pub fn perft(&mut self, depth: u32) -> u64 {
        if depth == 0 {
            return 1;
        }

        let us = self.turn;
        let mut nodes = 0;
        for mv in self.pseudo_legal_moves(&GenOptions::pseudo_legal()) {
            self.make_move(mv);
            if !self.king_attacked(us) {
                nodes += if depth > 1 { self.perft(depth - 1) } else { 1 };
            }
            self.undo_move();
        }
        nodes
    }

    /// Per-move leaf counts for each legal root move, in generation order.
    pub fn divide(&mut self, depth: u32) -> Vec<(Move, u64)> {
        let mut counts = Vec::new();
        if depth == 0 {
            return counts;
        }

        for mv in self.legal_moves(&GenOptions::legal()) {
            self.make_move(mv);
            let nodes = self.perft(depth - 1);
            self.undo_move();
            trace!("{}: {}", mv, nodes);
            counts.push((mv, nodes));
        }
        counts
    }
}
