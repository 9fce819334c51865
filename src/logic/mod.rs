//! Tournament business logic: entrant verification, seeding, progression.

mod bracket;
mod progression;
mod registry;

pub use bracket::build_bracket;
pub use progression::{advance_round_if_complete, record_match_result};
pub use registry::{PlayerRegistry, VerifyOutcome, VerifyTicket, REMOTE_SLOTS, TOURNAMENT_SIZE};
