pub mod roll;
pub mod slot;
pub mod types;

pub use roll::{BetMode, BetShape, GameType, GameTypeDescriptor, RollOutcome, RollSpec};
pub use slot::{Combination, SlotMachine, SpecialCombination, SpinOutcome, SENTINEL_SYMBOL};
pub use types::*;
