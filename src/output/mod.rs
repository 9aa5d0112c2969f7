pub mod export;
pub mod formatter;

pub use export::{export_csv, write_csv, DEFAULT_EXPORT_FILE};
pub use formatter::{
    format_age, format_history, format_intensity, format_ranking_table, format_score,
    format_stats, format_supplier_detail, format_tsv, format_weights, should_use_colors,
};
