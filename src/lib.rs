//! Pong tournament web app: library with models and tournament logic.

pub mod logic;
pub mod lookup;
pub mod models;

pub use logic::{
    advance_round_if_complete, build_bracket, record_match_result, PlayerRegistry, VerifyOutcome,
    VerifyTicket, REMOTE_SLOTS, TOURNAMENT_SIZE,
};
pub use lookup::{LookupError, UserDirectory, UserLookup};
pub use models::{
    BracketMatch, LedgerEntry, MatchId, MatchRecord, MatchSession, Phase, Player, PlayerId,
    ResultsLedger, Round, SetupView, Side, Tournament, TournamentError, TournamentId,
    TournamentView, WINNING_SCORE,
};
