//! Interactive step-debugger over a running search.
//!
//! The operator toggles `debug` through the UCI `debug on|off` command,
//! which only flips the flag guarded by [`SearchGlobals::debug_state`] and
//! notifies `debug_cv` — this module is the reader loop the search
//! controller runs once it observes `debug == true` with no steps pending.
//!
//! Input arrives over an [`mpsc::Receiver<String>`] rather than a raw
//! `BufRead`: the engine's stdin is already owned by a dedicated reader
//! thread (see the UCI crate's event loop), so console lines are forwarded
//! to the search thread over a channel instead of contending for a second
//! lock on stdin.

use std::io::Write;
use std::sync::mpsc::Receiver;

use crate::search::globals::SearchGlobals;
use crate::search::mcts::most_visited_child_index;
use crate::search::tree::{NodeId, Tree};

/// A cursor into the tree for operator inspection, independent of wherever
/// the search itself is currently descending.
pub struct DebugConsole {
    cursor: NodeId,
}

impl DebugConsole {
    pub fn new(root: NodeId) -> DebugConsole {
        DebugConsole { cursor: root }
    }

    /// Called at the top of each MCTS iteration. If debug is off, or a
    /// step count is still pending, returns immediately. Otherwise reads
    /// and executes operator commands from `lines` until a `step` or
    /// `ndebug`/`quit`/`stop` command is seen, or the channel closes.
    pub fn poll(
        &mut self,
        tree: &Tree,
        globals: &SearchGlobals,
        lines: &Receiver<String>,
        output: &mut impl Write,
    ) {
        {
            let mut state = globals.debug_state.lock().expect("debug_state mutex poisoned");
            if !state.debug {
                return;
            }
            if state.steps_remaining > 0 {
                state.steps_remaining -= 1;
                return;
            }
        }

        loop {
            self.print_node(tree, output);

            let Ok(line) = lines.recv() else {
                // The sender side closed: behave like `quit`.
                self.clear_debug(globals);
                return;
            };

            let mut parts = line.split_whitespace();
            let Some(cmd) = parts.next() else { continue };

            match cmd {
                "moves" | "children" | "ls" => self.print_children(tree, output),
                "child" => {
                    if let Some(uci) = parts.next() {
                        self.descend(tree, uci, output);
                    }
                }
                "parent" => self.ascend(tree, output),
                "step" | "s" => {
                    self.resume(globals, 1);
                    return;
                }
                "steps" => {
                    let n = parts.next().and_then(|s| s.parse().ok()).unwrap_or(1);
                    self.resume(globals, n);
                    return;
                }
                "ndebug" | "quit" | "stop" => {
                    self.clear_debug(globals);
                    return;
                }
                _ => {
                    let _ = writeln!(output, "unknown debug command: {cmd}");
                }
            }
        }
    }

    fn resume(&self, globals: &SearchGlobals, steps: u32) {
        let mut state = globals.debug_state.lock().expect("debug_state mutex poisoned");
        state.steps_remaining = steps.saturating_sub(1);
        globals.debug_cv.notify_all();
    }

    fn clear_debug(&self, globals: &SearchGlobals) {
        let mut state = globals.debug_state.lock().expect("debug_state mutex poisoned");
        state.debug = false;
        globals.debug_cv.notify_all();
    }

    fn descend(&mut self, tree: &Tree, uci: &str, output: &mut impl Write) {
        let node = tree.get(self.cursor);
        match node.children.iter().find(|&&id| tree.get(id).mv.to_uci() == uci) {
            Some(&id) => self.cursor = id,
            None => {
                let _ = writeln!(output, "no such child: {uci}");
            }
        }
    }

    fn ascend(&mut self, tree: &Tree, output: &mut impl Write) {
        match tree.get(self.cursor).parent {
            Some(parent) => self.cursor = parent,
            None => {
                let _ = writeln!(output, "already at root");
            }
        }
    }

    fn print_node(&self, tree: &Tree, output: &mut impl Write) {
        let node = tree.get(self.cursor);
        let best = most_visited_child_index(tree, self.cursor);
        let _ = writeln!(
            output,
            "depth={} visits={} score={:.3} terminal={} children={} best_child={:?}",
            tree.depth(self.cursor),
            node.visits,
            node.score,
            node.terminal,
            node.children.len(),
            best
        );
    }

    fn print_children(&self, tree: &Tree, output: &mut impl Write) {
        let node = tree.get(self.cursor);
        for (idx, &child_id) in node.children.iter().enumerate() {
            let child = tree.get(child_id);
            let prior = node.priors.get(idx).copied().unwrap_or(0.0);
            let q = if child.visits > 0 {
                child.score / child.visits as f64
            } else {
                0.0
            };
            let _ = writeln!(
                output,
                "{} visits={} score={:.3} prior={:.4} q={:.4}",
                child.mv.to_uci(),
                child.visits,
                child.score,
                prior,
                q
            );
        }
    }
}

/// Cheap check for the hot loop: whether the controller needs to call
/// [`DebugConsole::poll`] at all this iteration.
pub fn debug_active(globals: &SearchGlobals) -> bool {
    globals.debug_state.lock().expect("debug_state mutex poisoned").debug
}
