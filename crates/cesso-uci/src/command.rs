//! UCI command parsing.

use cesso_core::{Board, Move};

use crate::error::UciError;

/// Parsed `go` command parameters.
#[derive(Debug, Clone, Default)]
pub struct GoParams {
    /// White's remaining time, in milliseconds.
    pub wtime: Option<i64>,
    /// Black's remaining time, in milliseconds.
    pub btime: Option<i64>,
    /// White's increment per move, in milliseconds.
    pub winc: Option<i64>,
    /// Black's increment per move, in milliseconds.
    pub binc: Option<i64>,
    /// Moves remaining until the next time control.
    pub movestogo: Option<i64>,
    /// Fixed time to spend on this move, in milliseconds.
    pub movetime: Option<i64>,
    /// Fixed search depth (unused by the MCTS driver; accepted for
    /// protocol compatibility).
    pub depth: Option<u32>,
    /// Node budget for this search.
    pub nodes: Option<u64>,
    /// Search for a mate in this many moves (accepted, not specially
    /// handled — the driver has no mate-distance bookkeeping).
    pub mate: Option<u32>,
    /// Search until `stop`, ignoring all time controls.
    pub infinite: bool,
    /// Restrict the search to these root moves. Accepted but not
    /// enforced by the current driver.
    pub searchmoves: Vec<Move>,
}

impl GoParams {
    /// Convert to the engine crate's `go` parameters, dropping `ponder`
    /// (accepted at the UCI layer but not a distinct search mode here).
    pub fn to_engine(&self) -> cesso_engine::GoParams {
        cesso_engine::GoParams {
            wtime: self.wtime,
            btime: self.btime,
            winc: self.winc,
            binc: self.binc,
            movestogo: self.movestogo,
            movetime: self.movetime,
            depth: self.depth,
            nodes: self.nodes,
            mate: self.mate,
            infinite: self.infinite,
            searchmoves: self.searchmoves.clone(),
        }
    }
}

/// A parsed UCI command.
#[derive(Debug)]
pub enum Command {
    /// `uci` -- identify the engine.
    Uci,
    /// `isready` -- synchronization ping.
    IsReady,
    /// `ucinewgame` -- reset engine state.
    UciNewGame,
    /// `position` -- set up a board position with optional moves applied.
    Position(Board),
    /// `go ...` -- start a search with the given parameters.
    Go(GoParams),
    /// `stop` -- halt the current search.
    Stop,
    /// `debug on|off` -- toggle the interactive step-debugger.
    Debug(bool),
    /// `d` -- print the current board.
    D,
    /// `eval` -- print the static evaluation of the current position.
    Eval,
    /// `quit` -- exit the engine.
    Quit,
    /// Unrecognized command, or one this engine does not act on (e.g.
    /// `ponderhit`) -- silently ignored per the UCI spec.
    Unknown(String),
}

/// Parse a single line of UCI input into a [`Command`].
///
/// `board` is the engine's current position, needed to resolve `go
/// searchmoves` UCI move strings (which, like `position ... moves`,
/// cannot be disambiguated from notation alone).
pub fn parse_command(line: &str, board: &Board) -> Result<Command, UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return Ok(Command::Unknown(String::new()));
    }

    match tokens[0] {
        "uci" => Ok(Command::Uci),
        "isready" => Ok(Command::IsReady),
        "ucinewgame" => Ok(Command::UciNewGame),
        "stop" => Ok(Command::Stop),
        "quit" => Ok(Command::Quit),
        "d" => Ok(Command::D),
        "eval" => Ok(Command::Eval),
        "debug" => parse_debug(&tokens[1..]),
        "position" => parse_position(&tokens[1..]),
        "go" => parse_go(&tokens[1..], board),
        _ => Ok(Command::Unknown(tokens[0].to_string())),
    }
}

/// Parse `debug on|off`. Any other argument is treated as `off`, matching
/// the permissive spirit of the rest of the parser.
fn parse_debug(tokens: &[&str]) -> Result<Command, UciError> {
    Ok(Command::Debug(tokens.first() == Some(&"on")))
}

/// Parse the `position` command arguments.
///
/// Supports:
/// - `position startpos [moves e2e4 d7d5 ...]`
/// - `position fen <fen-string> [moves e2e4 d7d5 ...]`
fn parse_position(tokens: &[&str]) -> Result<Command, UciError> {
    if tokens.is_empty() {
        return Err(UciError::MalformedPosition);
    }

    let (mut board, rest) = if tokens[0] == "startpos" {
        let rest = &tokens[1..];
        (Board::starting_position(), rest)
    } else if tokens[0] == "fen" {
        // FEN is 6 space-separated fields
        if tokens.len() < 7 {
            return Err(UciError::InvalidFen {
                fen: tokens[1..].join(" "),
            });
        }
        let fen = tokens[1..7].join(" ");
        let board: Board = fen.parse().map_err(|_| UciError::InvalidFen { fen: fen.clone() })?;
        (board, &tokens[7..])
    } else {
        return Err(UciError::MalformedPosition);
    };

    // Apply moves if present: "moves e2e4 d7d5 ..."
    if !rest.is_empty() && rest[0] == "moves" {
        for uci_str in &rest[1..] {
            let mv = Move::from_uci(uci_str, &board).ok_or_else(|| UciError::InvalidMove {
                uci_move: uci_str.to_string(),
            })?;
            board = board.make_move(mv);
        }
    }

    Ok(Command::Position(board))
}

/// Parse the `go` command arguments: time controls, node/depth/mate
/// limits, `infinite`, `ponder` (accepted, not stored), and `searchmoves`.
fn parse_go(tokens: &[&str], board: &Board) -> Result<Command, UciError> {
    let mut params = GoParams::default();

    let mut i = 0;
    while i < tokens.len() {
        match tokens[i] {
            "wtime" => {
                params.wtime = Some(parse_value(tokens, &mut i, "wtime")?);
            }
            "btime" => {
                params.btime = Some(parse_value(tokens, &mut i, "btime")?);
            }
            "winc" => {
                params.winc = Some(parse_value(tokens, &mut i, "winc")?);
            }
            "binc" => {
                params.binc = Some(parse_value(tokens, &mut i, "binc")?);
            }
            "movestogo" => {
                params.movestogo = Some(parse_value(tokens, &mut i, "movestogo")?);
            }
            "movetime" => {
                params.movetime = Some(parse_value(tokens, &mut i, "movetime")?);
            }
            "depth" => {
                params.depth = Some(parse_value(tokens, &mut i, "depth")?);
            }
            "nodes" => {
                params.nodes = Some(parse_value(tokens, &mut i, "nodes")?);
            }
            "mate" => {
                params.mate = Some(parse_value(tokens, &mut i, "mate")?);
            }
            "infinite" => {
                params.infinite = true;
                i += 1;
            }
            "ponder" => {
                // Grammar-accepted, not a distinct search mode: we never
                // enter a pondering state, so there is nothing to store.
                i += 1;
            }
            "searchmoves" => {
                i += 1;
                while i < tokens.len() && !is_go_keyword(tokens[i]) {
                    let mv = Move::from_uci(tokens[i], board).ok_or_else(|| UciError::InvalidGoValue {
                        param: "searchmoves".to_string(),
                        value: tokens[i].to_string(),
                    })?;
                    params.searchmoves.push(mv);
                    i += 1;
                }
            }
            _ => {
                i += 1;
            }
        }
    }

    Ok(Command::Go(params))
}

fn is_go_keyword(token: &str) -> bool {
    matches!(
        token,
        "wtime"
            | "btime"
            | "winc"
            | "binc"
            | "movestogo"
            | "movetime"
            | "depth"
            | "nodes"
            | "mate"
            | "infinite"
            | "ponder"
            | "searchmoves"
    )
}

fn parse_value<T: std::str::FromStr>(tokens: &[&str], i: &mut usize, param: &str) -> Result<T, UciError> {
    let Some(raw) = tokens.get(*i + 1) else {
        return Err(UciError::MissingGoValue {
            param: param.to_string(),
        });
    };
    let value = raw.parse().map_err(|_| UciError::InvalidGoValue {
        param: param.to_string(),
        value: raw.to_string(),
    })?;
    *i += 2;
    Ok(value)
}
