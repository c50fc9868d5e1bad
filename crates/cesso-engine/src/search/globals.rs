//! Search-wide state shared between the controller, the UCI `stop`/`debug`
//! commands, and (conceptually) a future pondering thread.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Instant;

use cesso_core::Color;

/// Parsed `go` command parameters, carried by [`SearchGlobals`] for the
/// duration of one search.
#[derive(Debug, Clone, Default)]
pub struct GoParams {
    pub wtime: Option<i64>,
    pub btime: Option<i64>,
    pub winc: Option<i64>,
    pub binc: Option<i64>,
    pub movestogo: Option<i64>,
    pub movetime: Option<i64>,
    pub depth: Option<u32>,
    pub nodes: Option<u64>,
    pub mate: Option<u32>,
    pub infinite: bool,
    pub searchmoves: Vec<cesso_core::Move>,
}

/// Sampling cadence, in nodes, at which [`SearchGlobals::stop`] consults the
/// clock and node budget. Matches the legacy engine's `nodes & 127 == 0`.
const TIME_CHECK_INTERVAL: u64 = 128;

/// Safety margin subtracted from `end_time` when `movestogo == 1`, in
/// milliseconds.
const MOVESTOGO_ONE_MARGIN_MS: i64 = 50;

/// Shared state for one search: stop flag, node counter, elapsed-time
/// tracking, `go` parameters, and the interactive debug-stepper handshake.
pub struct SearchGlobals {
    stop_flag: Arc<AtomicBool>,
    nodes: AtomicU64,
    start_time: Mutex<Option<Instant>>,
    side_to_move: Mutex<Color>,
    go_params: Mutex<Option<GoParams>>,

    /// Guards `debug` and `searching`; paired with `debug_cv`.
    pub debug_state: Mutex<DebugState>,
    pub debug_cv: Condvar,
}

/// Fields guarded by [`SearchGlobals::debug_state`].
#[derive(Debug, Default)]
pub struct DebugState {
    pub debug: bool,
    pub searching: bool,
    /// Remaining MCTS iterations to run before re-entering the debug
    /// console. Decremented at the top of each iteration.
    pub steps_remaining: u32,
}

impl SearchGlobals {
    pub fn new(stop_flag: Arc<AtomicBool>) -> SearchGlobals {
        SearchGlobals {
            stop_flag,
            nodes: AtomicU64::new(0),
            start_time: Mutex::new(None),
            side_to_move: Mutex::new(Color::White),
            go_params: Mutex::new(None),
            debug_state: Mutex::new(DebugState::default()),
            debug_cv: Condvar::new(),
        }
    }

    /// Reset for a new search: clears the stop flag, zeroes the node
    /// counter, records `side_to_move`, and starts the clock.
    pub fn reset(&self, side_to_move: Color, go_params: Option<GoParams>) {
        self.stop_flag.store(false, Ordering::Release);
        self.nodes.store(0, Ordering::Relaxed);
        *self.side_to_move.lock().expect("side_to_move mutex poisoned") = side_to_move;
        *self.go_params.lock().expect("go_params mutex poisoned") = go_params;
        *self.start_time.lock().expect("start_time mutex poisoned") = Some(Instant::now());
    }

    pub fn nodes(&self) -> u64 {
        self.nodes.load(Ordering::Relaxed)
    }

    pub fn increment_nodes(&self) {
        self.nodes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stop_flag(&self) -> &Arc<AtomicBool> {
        &self.stop_flag
    }

    fn elapsed_ms(&self) -> i64 {
        self.start_time
            .lock()
            .expect("start_time mutex poisoned")
            .map_or(0, |s| s.elapsed().as_millis() as i64)
    }

    /// Whether the search should stop now.
    ///
    /// The explicit stop flag always wins. Otherwise, every
    /// [`TIME_CHECK_INTERVAL`] nodes, the node budget and clock are
    /// consulted against the stored `go` parameters.
    pub fn stop(&self) -> bool {
        if self.stop_flag.load(Ordering::Relaxed) {
            return true;
        }

        let nodes = self.nodes();
        if nodes % TIME_CHECK_INTERVAL != 0 {
            return false;
        }

        let go_params = self.go_params.lock().expect("go_params mutex poisoned");
        let Some(go) = go_params.as_ref() else {
            return false;
        };

        if let Some(budget) = go.nodes
            && nodes >= budget
        {
            self.stop_flag.store(true, Ordering::Release);
            return true;
        }

        if go.infinite {
            return false;
        }

        let side = *self.side_to_move.lock().expect("side_to_move mutex poisoned");
        let (time, inc) = match side {
            Color::White => (go.wtime, go.winc),
            Color::Black => (go.btime, go.binc),
        };

        if let (Some(time), Some(inc)) = (time, inc) {
            let movestogo = go.movestogo.unwrap_or(30);
            let mut end_time = (time + (movestogo - 1) * inc) / movestogo;
            if movestogo == 1 {
                end_time -= MOVESTOGO_ONE_MARGIN_MS;
            }
            // Clamp to 0: without this, a pathological (movestogo, inc) pair
            // could drive end_time negative and silently never fire.
            let end_time = end_time.max(0);
            if self.elapsed_ms() >= end_time {
                self.stop_flag.store(true, Ordering::Release);
                return true;
            }
        } else if let Some(movetime) = go.movetime
            && self.elapsed_ms() >= movetime
        {
            self.stop_flag.store(true, Ordering::Release);
            return true;
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    use cesso_core::Color;

    use super::{GoParams, SearchGlobals};

    #[test]
    fn infinite_search_never_time_stops() {
        let globals = SearchGlobals::new(Arc::new(AtomicBool::new(false)));
        globals.reset(
            Color::White,
            Some(GoParams {
                infinite: true,
                ..Default::default()
            }),
        );
        for _ in 0..256 {
            globals.increment_nodes();
        }
        assert!(!globals.stop());
    }

    #[test]
    fn external_stop_flag_wins() {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let globals = SearchGlobals::new(Arc::clone(&stop_flag));
        globals.reset(Color::White, None);
        stop_flag.store(true, std::sync::atomic::Ordering::Release);
        assert!(globals.stop());
    }

    #[test]
    fn node_budget_stops_search() {
        let globals = SearchGlobals::new(Arc::new(AtomicBool::new(false)));
        globals.reset(
            Color::White,
            Some(GoParams {
                nodes: Some(128),
                ..Default::default()
            }),
        );
        for _ in 0..128 {
            globals.increment_nodes();
        }
        assert!(globals.stop());
    }

    #[test]
    fn no_go_params_never_stops_on_time() {
        let globals = SearchGlobals::new(Arc::new(AtomicBool::new(false)));
        globals.reset(Color::White, None);
        for _ in 0..128 {
            globals.increment_nodes();
        }
        assert!(!globals.stop());
    }

    #[test]
    fn movestogo_one_subtracts_safety_margin() {
        // wtime=100, winc=0, movestogo=1 -> end_time = 100 - 50 = 50ms.
        // Since the search just started (elapsed ~ 0ms), it should not stop yet.
        let globals = SearchGlobals::new(Arc::new(AtomicBool::new(false)));
        globals.reset(
            Color::White,
            Some(GoParams {
                wtime: Some(100),
                winc: Some(0),
                movestogo: Some(1),
                ..Default::default()
            }),
        );
        for _ in 0..128 {
            globals.increment_nodes();
        }
        assert!(!globals.stop());
    }
}
