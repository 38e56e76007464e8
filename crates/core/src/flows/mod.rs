pub mod classify;
pub mod engine;
pub mod texts;

pub use classify::{classify, Intent, MenuChoice};
pub use engine::{advance, hard_reset, Reply, TurnEffect, TurnOutcome};
