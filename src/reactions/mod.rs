pub mod handlers;
pub mod ledger;

pub use ledger::{ReactionCounts, ReactionKind, ReactionLedger, TargetKind};
