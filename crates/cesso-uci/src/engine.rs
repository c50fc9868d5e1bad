//! Event-driven UCI engine loop.
//!
//! A dedicated thread owns stdin and forwards raw lines to the main loop
//! over a channel. The main loop decides, per line, whether to parse it as
//! a UCI command or forward it to a running search's debug console: `quit`,
//! `stop`, and `debug ...` are always handled as commands, everything else
//! goes to the debug channel while a search is in flight and `debug on` has
//! been set (and is simply parsed-and-ignored-as-`Unknown` otherwise).

use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

use tracing::{debug, info, warn};

use cesso_core::Board;
use cesso_engine::{run_search, GoParams as EngineGoParams, Position, SearchGlobals, SearchResult};

use crate::command::{parse_command, Command, GoParams};
use crate::error::UciError;

/// Internal engine state — tracks whether a search is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Idle,
    Searching,
}

/// Events processed by the main engine loop.
enum EngineEvent {
    Line(String),
    SearchDone(SearchResult),
    InputClosed,
}

/// The UCI engine, holding current board state and driving the search thread.
pub struct UciEngine {
    board: Board,
    state: EngineState,
    globals: Arc<SearchGlobals>,
    /// Sender for the debug console of whichever search is currently
    /// running. `None` when idle.
    debug_tx: Option<mpsc::Sender<String>>,
}

impl UciEngine {
    /// Create a new engine with the starting position.
    pub fn new() -> Self {
        Self {
            board: Board::starting_position(),
            state: EngineState::Idle,
            globals: Arc::new(SearchGlobals::new(Arc::new(AtomicBool::new(false)))),
            debug_tx: None,
        }
    }

    /// Run the UCI event loop, reading from stdin until `quit` or input closes.
    pub fn run(mut self) -> Result<(), UciError> {
        let (tx, rx) = mpsc::channel::<EngineEvent>();

        let stdin_tx = tx.clone();
        std::thread::spawn(move || {
            let stdin = io::stdin();
            let reader = stdin.lock();
            for line in reader.lines() {
                match line {
                    Ok(line) => {
                        let trimmed = line.trim().to_string();
                        if trimmed.is_empty() {
                            continue;
                        }
                        if stdin_tx.send(EngineEvent::Line(trimmed)).is_err() {
                            break;
                        }
                    }
                    Err(_) => {
                        let _ = stdin_tx.send(EngineEvent::InputClosed);
                        break;
                    }
                }
            }
            let _ = stdin_tx.send(EngineEvent::InputClosed);
        });

        for event in &rx {
            match event {
                EngineEvent::Line(line) => {
                    if self.route_to_debug_console(&line) {
                        continue;
                    }

                    debug!(cmd = %line, "received UCI command");
                    match parse_command(&line, &self.board) {
                        Ok(Command::Uci) => self.handle_uci(),
                        Ok(Command::IsReady) => self.handle_isready(),
                        Ok(Command::UciNewGame) => self.handle_ucinewgame(),
                        Ok(Command::Position(board)) => self.handle_position(board),
                        Ok(Command::Go(params)) => self.handle_go(params, &tx),
                        Ok(Command::Stop) => self.handle_stop(),
                        Ok(Command::Debug(on)) => self.handle_debug(on, &tx),
                        Ok(Command::D) => self.handle_d(),
                        Ok(Command::Eval) => self.handle_eval(),
                        Ok(Command::Quit) => {
                            if self.state == EngineState::Searching {
                                self.handle_stop();
                                for ev in &rx {
                                    if let EngineEvent::SearchDone(result) = ev {
                                        self.finish_search(result);
                                        break;
                                    }
                                }
                            }
                            break;
                        }
                        Ok(Command::Unknown(_)) => {}
                        Err(e) => warn!(error = %e, "UCI parse error"),
                    }
                }
                EngineEvent::SearchDone(result) => self.finish_search(result),
                EngineEvent::InputClosed => break,
            }
        }

        info!("cesso shutting down");
        Ok(())
    }

    /// `quit`, `stop`, and anything starting with `debug` always go through
    /// the normal parser, since they either control the engine globally or
    /// toggle the very flag the debug console is gated on. Everything else
    /// is routed to the running search's debug console while one is live.
    fn route_to_debug_console(&self, line: &str) -> bool {
        let first = line.split_whitespace().next().unwrap_or("");
        if matches!(first, "quit" | "stop" | "debug") {
            return false;
        }
        match &self.debug_tx {
            Some(tx) if self.globals.debug_state.lock().expect("debug_state mutex poisoned").debug => {
                let _ = tx.send(line.to_string());
                true
            }
            _ => false,
        }
    }

    fn handle_uci(&self) {
        println!("id name cesso");
        println!("id author Nicolas Lazaro");
        println!("uciok");
    }

    fn handle_isready(&self) {
        println!("readyok");
    }

    fn handle_ucinewgame(&mut self) {
        self.board = Board::starting_position();
    }

    fn handle_position(&mut self, board: Board) {
        self.board = board;
    }

    fn handle_go(&mut self, params: GoParams, tx: &mpsc::Sender<EngineEvent>) {
        if self.state == EngineState::Searching {
            warn!("go received while not idle, ignoring");
            return;
        }
        self.spawn_search(params.to_engine(), tx);
    }

    /// `debug on` starts an infinite background search to step through if
    /// the engine is idle; `debug off` only clears the flag, it does not
    /// stop whatever search is running.
    fn handle_debug(&mut self, on: bool, tx: &mpsc::Sender<EngineEvent>) {
        if on && self.state == EngineState::Idle {
            self.spawn_search(
                EngineGoParams {
                    infinite: true,
                    ..Default::default()
                },
                tx,
            );
        }
        let mut state = self.globals.debug_state.lock().expect("debug_state mutex poisoned");
        state.debug = on;
        self.globals.debug_cv.notify_all();
    }

    fn spawn_search(&mut self, params: EngineGoParams, tx: &mpsc::Sender<EngineEvent>) {
        let mut pos = Position::new(self.board);
        let globals = Arc::clone(&self.globals);
        let (debug_tx, debug_rx) = mpsc::channel::<String>();
        self.debug_tx = Some(debug_tx);
        let tx = tx.clone();

        std::thread::spawn(move || {
            globals.reset(pos.side_to_move(), Some(params));
            let result = run_search(
                &mut pos,
                &globals,
                |visits, nodes, elapsed, pv| {
                    let elapsed_ms = elapsed.as_millis().max(1);
                    let nps = (nodes as u128 * 1000) / elapsed_ms;
                    let pv_str: String = pv.iter().map(|m| m.to_uci()).collect::<Vec<_>>().join(" ");
                    println!(
                        "info visits {} nodes {} nps {} time {} pv {}",
                        visits, nodes, nps, elapsed_ms, pv_str
                    );
                },
                Some((&debug_rx, &mut io::stdout())),
            );
            let _ = tx.send(EngineEvent::SearchDone(result));
        });

        self.state = EngineState::Searching;
    }

    fn handle_stop(&mut self) {
        self.globals.stop_flag().store(true, Ordering::Release);
    }

    fn handle_d(&self) {
        println!("{}", self.board.pretty());
    }

    fn handle_eval(&self) {
        let pos = Position::new(self.board);
        println!("info string eval cp {}", cesso_engine::evaluate(&pos));
    }

    fn finish_search(&mut self, result: SearchResult) {
        self.debug_tx = None;
        self.globals.debug_state.lock().expect("debug_state mutex poisoned").debug = false;
        if result.best_move.is_null() {
            println!("bestmove 0000");
        } else {
            println!("bestmove {}", result.best_move.to_uci());
        }
        self.state = EngineState::Idle;
    }
}

impl Default for UciEngine {
    fn default() -> Self {
        Self::new()
    }
}
