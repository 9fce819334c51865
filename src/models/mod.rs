//! Data structures for the Pong tournament: players, matches, bracket state.

mod game;
mod ledger;
mod player;
mod tournament;
mod view;

pub use game::{BracketMatch, MatchId, MatchRecord, MatchSession, Round, Side, WINNING_SCORE};
pub use ledger::{LedgerEntry, ResultsLedger};
pub use player::{Player, PlayerId};
pub use tournament::{Phase, Tournament, TournamentError, TournamentId};
pub use view::{
    CurrentMatchView, MatchView, RoundView, SetupView, SlotView, StandingView, TournamentView,
};
