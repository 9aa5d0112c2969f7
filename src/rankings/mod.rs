pub mod filter;
pub mod stats;

pub use filter::{CertificationFilter, RankingFilter, ScoreRange};
pub use stats::{
    dashboard_stats, score_distribution, sector_breakdown, top_performers, DashboardStats,
    ScoreBucket, DEFAULT_TOP_PERFORMERS,
};
