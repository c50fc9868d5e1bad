//! Top-level MCTS search driver.
//!
//! Builds a fresh tree at the root position and repeatedly runs
//! select/expand/rollout/backprop until [`SearchGlobals::stop`] fires,
//! periodically reporting progress through the `on_iter` callback and
//! yielding to the interactive debug console when asked.

use std::io::Write;
use std::sync::mpsc::Receiver;
use std::time::Instant;

use cesso_core::Move;

use crate::position::Position;
use crate::search::debug::{debug_active, DebugConsole};
use crate::search::globals::SearchGlobals;
use crate::search::mcts::{backprop, expand, principal_variation, rollout, select, DEFAULT_PV_LENGTH};
use crate::search::tree::Tree;

/// Result of a completed MCTS search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Most-visited move from the root, or `Move::NULL` if the root has no
    /// legal moves (checkmate or stalemate).
    pub best_move: Move,
    /// Principal variation, following the most-visited child at each ply.
    pub pv: Vec<Move>,
    /// Total MCTS iterations (playouts) run.
    pub visits: u32,
    /// Total leaf nodes visited across rollouts (mirrors `SearchGlobals::nodes`).
    pub nodes: u64,
    /// Root win probability in `[0, 1]` from the side to move's perspective.
    pub win_probability: f64,
}

/// Reports progress every this many completed iterations.
const INFO_INTERVAL: u32 = 1000;

/// Minimum time since the last `info` line before another is due, in
/// milliseconds.
const INFO_MIN_INTERVAL_MS: u128 = 1000;

/// Whether an `info` line is due: every [`INFO_INTERVAL`] visits, but never
/// more often than [`INFO_MIN_INTERVAL_MS`].
fn should_emit_info(visits: u32, since_last_info_ms: u128) -> bool {
    visits % INFO_INTERVAL == 0 && since_last_info_ms >= INFO_MIN_INTERVAL_MS
}

/// Run an MCTS search from `pos` until `globals` signals a stop.
///
/// `on_info` is called every [`INFO_INTERVAL`] visits, throttled to at most
/// once every [`INFO_MIN_INTERVAL_MS`], with `(visits, nodes, elapsed, pv)`
/// so the caller can emit UCI `info` lines. `debug_io` is polled at the top of
/// every iteration for the interactive step-debugger — lines arrive over a
/// channel rather than a raw reader, since stdin is owned by the UCI
/// layer's own reader thread; pass `None` to run without one (e.g. under
/// test).
pub fn search(
    pos: &mut Position,
    globals: &SearchGlobals,
    mut on_info: impl FnMut(u32, u64, std::time::Duration, &[Move]),
    mut debug_io: Option<(&Receiver<String>, &mut dyn Write)>,
) -> SearchResult {
    globals.reset(pos.side_to_move(), None);
    let start = Instant::now();
    let mut last_info = start;
    let mut tree = Tree::new();
    let root = tree.root();
    let mut console = DebugConsole::new(root);

    if globals.stop() {
        return finish(&tree, root, globals, start);
    }

    loop {
        if let Some((lines, output)) = debug_io.as_mut() {
            if debug_active(globals) {
                console.poll(&tree, globals, lines, &mut **output);
            }
        }

        let selected = select(pos, &tree, root);
        let expanded = expand(pos, &mut tree, selected);
        let value = rollout(pos, &tree, expanded);
        backprop(&mut tree, expanded, value);
        globals.increment_nodes();

        let visits = tree.get(root).visits;
        if should_emit_info(visits, last_info.elapsed().as_millis()) {
            let pv = principal_variation(&tree, root, DEFAULT_PV_LENGTH);
            on_info(visits, globals.nodes(), start.elapsed(), &pv);
            last_info = Instant::now();
        }

        if globals.stop() {
            break;
        }
    }

    finish(&tree, root, globals, start)
}

fn finish(tree: &Tree, root: crate::search::tree::NodeId, globals: &SearchGlobals, _start: Instant) -> SearchResult {
    let pv = principal_variation(tree, root, DEFAULT_PV_LENGTH);
    let best_move = pv.first().copied().unwrap_or(Move::NULL);
    let root_node = tree.get(root);
    let win_probability = if root_node.visits > 0 {
        root_node.score / root_node.visits as f64
    } else {
        0.5
    };

    SearchResult {
        best_move,
        pv,
        visits: root_node.visits,
        nodes: globals.nodes(),
        win_probability,
    }
}
