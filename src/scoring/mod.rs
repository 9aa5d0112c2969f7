pub mod config;
pub mod factors;
pub mod engine;
pub mod validation;

pub use config::*;
pub use engine::{
    breakdown, rank_all, score, score_batch, score_with_ceiling, FactorContribution,
    ScoreBreakdown,
};
pub use validation::{validate_normalization, validate_weights};
pub use factors::round_one_decimal;
