//! Tournament state and error type.

use crate::models::game::{BracketMatch, MatchRecord, Round};
use crate::models::ledger::ResultsLedger;
use crate::models::player::{Player, PlayerId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors that can occur during tournament operations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TournamentError {
    /// An entrant slot was submitted with an empty username.
    EmptyUsername,
    /// An entrant slot was submitted with the local user's own username.
    SelfEntry,
    /// The username is already entered in another slot.
    DuplicateEntry,
    /// The user directory has no user with this username.
    PlayerNotFound,
    /// The user directory could not be reached.
    LookupFailed,
    /// No such entrant slot (valid slots are 2..=8).
    SlotOutOfRange(usize),
    /// A bracket needs exactly 8 players.
    WrongPlayerCount { expected: usize, got: usize },
    /// The same player id appears twice among the entrants.
    DuplicatePlayer(PlayerId),
    /// Not all 7 remote slots are verified yet.
    NotAllVerified,
    /// The session is not in a state that allows this action.
    InvalidState,
    /// No playable match at the cursor: the tournament is decided, or the
    /// round is complete and has not been advanced yet.
    NoCurrentMatch,
    /// The match already has a winner.
    MatchFinished,
}

impl std::fmt::Display for TournamentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentError::EmptyUsername => write!(f, "Enter a username"),
            TournamentError::SelfEntry => write!(f, "You cannot enter yourself as an opponent"),
            TournamentError::DuplicateEntry => write!(f, "That player has already been entered"),
            TournamentError::PlayerNotFound => write!(f, "Player not found"),
            TournamentError::LookupFailed => write!(f, "Could not reach the user directory"),
            TournamentError::SlotOutOfRange(slot) => write!(f, "No such entrant slot: {}", slot),
            TournamentError::WrongPlayerCount { expected, got } => {
                write!(f, "Need exactly {} players to seed a bracket (got {})", expected, got)
            }
            TournamentError::DuplicatePlayer(_) => write!(f, "The same player cannot enter twice"),
            TournamentError::NotAllVerified => write!(f, "All 7 opponents must be verified first"),
            TournamentError::InvalidState => write!(f, "Invalid state for this action"),
            TournamentError::NoCurrentMatch => write!(f, "No match is waiting to be played"),
            TournamentError::MatchFinished => write!(f, "This match already has a winner"),
        }
    }
}

impl std::error::Error for TournamentError {}

/// Unique identifier for a tournament session.
pub type TournamentId = Uuid;

/// Where the bracket stands. Derived from state, never stored.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// The cursor points at an unplayed match.
    AwaitingMatch,
    /// Every match of the current round is decided; the next round has not
    /// been seeded yet.
    RoundComplete,
    /// The final is decided; the tournament is over.
    Champion,
}

/// Full bracket state for one 8-player single-elimination tournament.
///
/// Mutated only through the progression operations; dropped with the hosting
/// session, never persisted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    /// All 8 entrants, in seeding order.
    pub players: Vec<Player>,
    /// Every match seeded so far. Only grows; a match is only ever mutated to
    /// set its winner, once.
    pub matches: Vec<BracketMatch>,
    pub current_round: Round,
    /// 0-based cursor within the current round.
    pub current_match_index: usize,
    /// The champion, set exactly once when the final is decided.
    pub winner: Option<Player>,
    /// Cumulative per-player stats for this tournament only.
    pub ledger: ResultsLedger,
    /// Decided matches in the order they finished.
    pub history: Vec<MatchRecord>,
}

impl Tournament {
    /// A freshly seeded tournament at the quarterfinals. Callers go through
    /// the bracket builder, which validates the entrant set.
    pub(crate) fn new(players: Vec<Player>, matches: Vec<BracketMatch>) -> Self {
        let ledger = ResultsLedger::seeded(&players);
        Self {
            id: Uuid::new_v4(),
            players,
            matches,
            current_round: Round::QuarterFinal,
            current_match_index: 0,
            winner: None,
            ledger,
            history: Vec::new(),
        }
    }

    /// Matches of one round, in match-index order.
    pub fn round_matches(&self, round: Round) -> impl Iterator<Item = &BracketMatch> {
        self.matches.iter().filter(move |m| m.round == round)
    }

    /// The match the cursor points at.
    ///
    /// Pure query: fails with [`TournamentError::NoCurrentMatch`] when the
    /// tournament is decided or the current round's matches are exhausted
    /// (the round must then be advanced explicitly).
    pub fn current_match(&self) -> Result<&BracketMatch, TournamentError> {
        if self.winner.is_some() {
            return Err(TournamentError::NoCurrentMatch);
        }
        self.round_matches(self.current_round)
            .nth(self.current_match_index)
            .ok_or(TournamentError::NoCurrentMatch)
    }

    /// Derived phase of the bracket.
    pub fn phase(&self) -> Phase {
        if self.winner.is_some() {
            return Phase::Champion;
        }
        if self.current_match_index >= self.round_matches(self.current_round).count() {
            return Phase::RoundComplete;
        }
        Phase::AwaitingMatch
    }

    /// Entrant with the given id, if any.
    pub fn player_by_id(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }
}
