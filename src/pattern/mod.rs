//! Template method example, unrelated to transactions.

mod stealing;

pub use stealing::{HalflingThief, Heist, HitAndRunMethod, StealingMethod, SubtleMethod};
