//! The four MCTS phases — select, expand, rollout, backprop — plus PV
//! reconstruction and the most-visited-child policy used to pick a move.

use cesso_core::Move;

use crate::position::{GameState, Position};
use crate::search::alphabeta::{alphabeta, MATE};
use crate::search::tree::{NodeId, Tree};

/// Default maximum length of a reconstructed principal variation.
pub const DEFAULT_PV_LENGTH: usize = 8;

/// Descend from `start` choosing the child with the highest PUCT score at
/// each step, stopping at a node with empty children or an unfinished
/// expansion cursor. Plays each chosen child's move on `pos` along the way.
pub fn select(pos: &mut Position, tree: &Tree, start: NodeId) -> NodeId {
    let node = tree.get(start);
    if node.children.is_empty() || node.expansion_cursor < node.children.len() {
        return start;
    }

    let mut best_idx = 0;
    let mut best_score = tree.child_puct_score(start, 0);
    for idx in 1..node.children.len() {
        let score = tree.child_puct_score(start, idx);
        if score > best_score {
            best_score = score;
            best_idx = idx;
        }
    }

    let child = node.children[best_idx];
    pos.make_move(tree.get(child).mv);
    select(pos, tree, child)
}

/// Expand `selected`: create its children if it has none, or hand back the
/// next not-yet-visited child (advancing `pos` onto that child's move).
pub fn expand(pos: &mut Position, tree: &mut Tree, selected: NodeId) -> NodeId {
    let node = tree.get(selected);

    if node.children.is_empty() {
        if node.terminal {
            return selected;
        }

        let moves = pos.legal_moves();
        if moves.is_empty() {
            tree.get_mut(selected).terminal = true;
            return selected;
        }

        tree.create_children(selected, pos, &moves);
        return selected;
    }

    if node.expansion_cursor < node.children.len() {
        let cursor = node.expansion_cursor;
        let child = node.children[cursor];
        tree.get_mut(selected).expansion_cursor += 1;
        pos.make_move(tree.get(child).mv);
        return child;
    }

    selected
}

/// `sigma(x) = 1 / (1 + 10^(-1.13 * x / 400))`, mapping a centipawn score to
/// a win probability in `(0, 1)`.
fn sigma(x: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf(-1.13 * x / 400.0))
}

/// Roll out `expanded` to a leaf value in `[0, 1]` from the expanded
/// position, then rewind `pos` back to the node the selection phase
/// started from.
///
/// Terminal draws score `0.5`; checkmate scores `0.0` for the side to move
/// (it has lost); an in-progress position is scored by a one-ply alpha-beta
/// search squashed through [`sigma`]. The return value is `1 - score`: the
/// value from the *parent's* point of view, since backprop alternates sign
/// at every level.
pub fn rollout(pos: &mut Position, tree: &Tree, expanded: NodeId) -> f64 {
    let score = match pos.game_state() {
        GameState::ThreefoldRepetition | GameState::FiftyMoves | GameState::Stalemate => 0.5,
        GameState::Checkmate => 0.0,
        GameState::InProgress => sigma(0.1 * alphabeta(pos, -MATE, MATE, 1) as f64),
    };

    pos.unmake_n(tree.depth(expanded));
    1.0 - score
}

/// Backprop `score` from `node` up to (but not past) the root.
pub fn backprop(tree: &mut Tree, node: NodeId, score: f64) {
    let mut current = Some(node);
    let mut value = score;

    while let Some(id) = current {
        let n = tree.get_mut(id);
        n.visits += 1;
        n.score += value;
        value = 1.0 - value;
        current = n.parent;
    }
}

/// Index of the most-visited child, ties broken by lowest index.
pub fn most_visited_child_index(tree: &Tree, node: NodeId) -> Option<usize> {
    let children = &tree.get(node).children;
    if children.is_empty() {
        return None;
    }

    let mut best_idx = 0;
    let mut best_visits = tree.get(children[0]).visits;
    for (idx, &child) in children.iter().enumerate().skip(1) {
        let visits = tree.get(child).visits;
        if visits > best_visits {
            best_visits = visits;
            best_idx = idx;
        }
    }
    Some(best_idx)
}

/// Reconstruct the principal variation from `node`, following the
/// most-visited child at each step up to `max_len` moves.
pub fn principal_variation(tree: &Tree, node: NodeId, max_len: usize) -> Vec<Move> {
    let mut pv = Vec::new();
    let mut current = node;

    while pv.len() < max_len {
        let Some(idx) = most_visited_child_index(tree, current) else {
            break;
        };
        let child = tree.get(current).children[idx];
        pv.push(tree.get(child).mv);
        current = child;
    }

    pv
}

#[cfg(test)]
mod tests {
    use super::{backprop, expand, rollout, select};
    use crate::position::Position;
    use crate::search::tree::Tree;

    #[test]
    fn select_returns_root_on_fresh_tree() {
        let tree = Tree::new();
        let mut pos = Position::starting();
        let root = tree.root();
        assert_eq!(select(&mut pos, &tree, root), root);
    }

    #[test]
    fn select_expand_rollout_backprop_one_iteration() {
        let mut tree = Tree::new();
        let mut pos = Position::starting();
        let root = tree.root();

        let selected = select(&mut pos, &tree, root);
        let expanded = expand(&mut pos, &mut tree, selected);
        assert!(!tree.get(root).children.is_empty());

        let score = rollout(&mut pos, &tree, expanded);
        assert!((0.0..=1.0).contains(&score));

        backprop(&mut tree, expanded, score);
        assert_eq!(tree.get(root).visits, 1);
        assert_eq!(tree.get(expanded).visits, 1);
    }

    #[test]
    fn rollout_restores_position() {
        let mut tree = Tree::new();
        let mut pos = Position::starting();
        let root = tree.root();
        let hash_before = pos.hash();

        let selected = select(&mut pos, &tree, root);
        let expanded = expand(&mut pos, &mut tree, selected);
        rollout(&mut pos, &tree, expanded);

        assert_eq!(pos.hash(), hash_before);
    }

    #[test]
    fn checkmate_rollout_scores_parent_as_win() {
        // Black to move, checkmated: rollout score for the mated side is 0,
        // so from the parent's perspective it's 1 - 0 = 1 (a win for White).
        let mut tree = Tree::new();
        let mut pos = Position::new("7k/6Q1/5K2/8/8/8/8/8 b - - 0 1".parse().unwrap());
        let root = tree.root();
        let expanded = expand(&mut pos, &mut tree, root);
        let score = rollout(&mut pos, &tree, expanded);
        assert_eq!(score, 1.0);
    }
}
