//! Monte-Carlo tree search, static evaluation's one-ply rollout leaf, and the
//! interactive step-debugger.

pub mod alphabeta;
pub mod controller;
pub mod debug;
pub mod globals;
pub mod mcts;
pub mod tree;

pub use controller::{search, SearchResult};
pub use globals::{GoParams, SearchGlobals};
