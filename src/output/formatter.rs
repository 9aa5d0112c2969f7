use std::io::IsTerminal;
use chrono::{DateTime, Duration, Utc};
use owo_colors::OwoColorize;
use terminal_size::{Width, terminal_size};

use crate::rankings::{DashboardStats, ScoreBucket};
use crate::scoring::{ScoreBreakdown, WeightsConfig};
use crate::storage::BatchRecord;
use crate::supplier::ScoredSupplier;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a score with one decimal.
/// If incomplete is true, appends asterisk to indicate a fallback was used
pub fn format_score(score: f64, incomplete: bool) -> String {
    if incomplete {
        format!("{:.1}*", score)
    } else {
        format!("{:.1}", score)
    }
}

/// Color a preformatted score by band: >=80 green, >=60 cyan, >=40 yellow, else red
fn paint_score(text: &str, score: f64) -> String {
    if score >= 80.0 {
        text.green().bold().to_string()
    } else if score >= 60.0 {
        text.cyan().to_string()
    } else if score >= 40.0 {
        text.yellow().to_string()
    } else {
        text.red().to_string()
    }
}

/// Format an optional intensity with two decimals, "N/A" when undefined
pub fn format_intensity(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{:.2}", v))
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, accounting for Unicode
fn truncate_text(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Format suppliers as a ranked table with columns: Rank, Score, Name, Sector, Country
/// No headers. Rank column: 4 chars (fits "999."), right-aligned
/// Score column is right-aligned, 6 chars wide (fits "100.0*")
pub fn format_ranking_table(suppliers: &[&ScoredSupplier], use_colors: bool) -> String {
    if suppliers.is_empty() {
        return "No suppliers found.".to_string();
    }

    let term_width = get_terminal_width();
    let rank_width = 4;
    let score_width = 6;
    let separator = "  ";

    suppliers
        .iter()
        .map(|scored| {
            let s = &scored.supplier;
            let rank_str = format!("{:>width$}", format!("{}.", scored.rank), width = rank_width);
            let score_str = format_score(scored.score, scored.incomplete);
            let score_padded = format!("{:>width$}", score_str, width = score_width);
            let sector = s.sector.as_deref().unwrap_or("-");
            let country = s.country.as_deref().unwrap_or("-");

            let fixed_width = rank_width
                + 1
                + score_width
                + separator.len() * 3
                + sector.chars().count()
                + country.chars().count();

            let name = match term_width {
                Some(width) if width > fixed_width + 10 => truncate_text(&s.name, width - fixed_width),
                Some(_) => truncate_text(&s.name, 20),
                None => s.name.clone(),
            };

            if use_colors {
                format!(
                    "{} {}{}{}{}{}{}{}",
                    rank_str.dimmed(),
                    paint_score(&score_padded, scored.score),
                    separator,
                    name.bold(),
                    separator,
                    sector.cyan(),
                    separator,
                    country.yellow()
                )
            } else {
                format!(
                    "{} {}{}{}{}{}{}{}",
                    rank_str, score_padded, separator, name, separator, sector, separator, country
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format suppliers as tab-separated values for scripting
/// Columns: rank, score, supplier_id, name, sector, country (no headers, no colors)
pub fn format_tsv(suppliers: &[&ScoredSupplier]) -> String {
    suppliers
        .iter()
        .map(|scored| {
            let s = &scored.supplier;
            format!(
                "{}\t{:.1}\t{}\t{}\t{}\t{}",
                scored.rank,
                scored.score,
                s.supplier_id,
                s.name,
                s.sector.as_deref().unwrap_or(""),
                s.country.as_deref().unwrap_or("")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format one supplier with its inputs and score breakdown
pub fn format_supplier_detail(
    scored: &ScoredSupplier,
    breakdown: &ScoreBreakdown,
    use_colors: bool,
) -> String {
    let s = &scored.supplier;
    let score_str = format_score(scored.score, scored.incomplete);
    let title = format!("#{} {} ({})", scored.rank, s.name, s.supplier_id);

    let mut lines = vec![if use_colors {
        format!("{}  {}", title.bold(), paint_score(&score_str, scored.score))
    } else {
        format!("{}  {}", title, score_str)
    }];

    lines.push(format!("  Country: {}", s.country.as_deref().unwrap_or("-")));
    lines.push(format!("  Sector: {}", s.sector.as_deref().unwrap_or("-")));
    lines.push(format!(
        "  Revenue: {}",
        s.revenue_usd_m.map_or_else(|| "N/A".to_string(), |r| format!("${}M", r))
    ));
    lines.push(format!(
        "  Intensity (tCO2e/$M): S1 {} | S2 {} | S3 {}",
        format_intensity(scored.s1_intensity),
        format_intensity(scored.s2_intensity),
        format_intensity(scored.s3_intensity)
    ));
    lines.push(format!(
        "  ISO 14001: {}  B-Corp: {}  Fair Trade: {}  Decarbonization target: {}",
        yes_no(s.is_iso14001),
        yes_no(s.is_bcorp),
        yes_no(s.is_fairtrade),
        yes_no(s.has_decarb_target)
    ));

    lines.push(String::new());
    lines.push("  Breakdown:".to_string());
    for factor in &breakdown.factors {
        let marker = if factor.fallback { " *" } else { "" };
        lines.push(format!(
            "    {:<15} {:>5.3} x {:>3.0}% = {:>5.1}{}",
            factor.label,
            factor.norm,
            factor.weight * 100.0,
            factor.points,
            marker
        ));
    }
    lines.push(format!("    {:<15} {:>26.1}", "Total", breakdown.total));

    if scored.incomplete {
        lines.push(String::new());
        lines.push("  * estimated from missing or zero input".to_string());
    }

    lines.join("\n")
}

/// Format dashboard metrics, score distribution, sectors and top performers
pub fn format_stats(
    stats: &DashboardStats,
    distribution: &[ScoreBucket],
    sectors: &[(String, usize)],
    top: &[&ScoredSupplier],
    use_colors: bool,
) -> String {
    let heading = |text: &str| {
        if use_colors {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    };

    let mut lines = vec![
        heading("Overview"),
        format!("  Suppliers: {}", stats.total),
        format!("  Average score: {:.1}", stats.average_score),
        format!("  Top score: {:.1}", stats.top_score),
        format!("  Certified: {}", stats.certified),
        format!("  Average S1+S2 intensity: {:.2} tCO2e/$M", stats.average_intensity),
        format!("  With decarbonization targets: {}", stats.with_targets),
        String::new(),
        heading("Score distribution"),
    ];

    let max = distribution.iter().map(|b| b.count).max().unwrap_or(0);
    for bucket in distribution {
        let bar_len = if max == 0 { 0 } else { bucket.count * 30 / max };
        lines.push(format!(
            "  {:>6}  {:>4}  {}",
            bucket.label,
            bucket.count,
            "#".repeat(bar_len)
        ));
    }

    lines.push(String::new());
    lines.push(heading("Sectors"));
    for (sector, count) in sectors {
        lines.push(format!("  {:<24} {:>4}", sector, count));
    }

    lines.push(String::new());
    lines.push(heading("Top performers"));
    lines.push(format_ranking_table(top, use_colors));

    lines.join("\n")
}

/// Format uploaded batches relative to `now`, one per line
pub fn format_history(batches: &[BatchRecord], now: DateTime<Utc>, use_colors: bool) -> String {
    if batches.is_empty() {
        return "No batches uploaded yet.".to_string();
    }

    batches
        .iter()
        .map(|batch| {
            let age = format_age(now - batch.uploaded_at);
            let status = match batch.processed_at {
                Some(_) => format!("{} suppliers, {} skipped", batch.record_count, batch.skipped),
                None => "not processed".to_string(),
            };
            if use_colors {
                format!(
                    "{:>4}  {}  {}  {}",
                    age.dimmed(),
                    batch.id.cyan(),
                    batch.source_name.bold(),
                    status
                )
            } else {
                format!("{:>4}  {}  {}  {}", age, batch.id, batch.source_name, status)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format configured weights as percentages with their total
pub fn format_weights(weights: &WeightsConfig) -> String {
    let mut lines: Vec<String> = weights
        .entries()
        .iter()
        .map(|(name, value)| format!("  {:<8} {:>6.2}%", name, value))
        .collect();
    lines.push(format!("  {:<8} {:>6.2}%", "total", weights.total()));
    lines.join("\n")
}

/// Format a duration into a human-readable age string
/// "2h" for hours, "3d" for days, "1w" for weeks
pub fn format_age(duration: Duration) -> String {
    let hours = duration.num_hours();
    let days = duration.num_days();
    let weeks = days / 7;

    if weeks >= 1 {
        format!("{}w", weeks)
    } else if days >= 1 {
        format!("{}d", days)
    } else if hours >= 1 {
        format!("{}h", hours)
    } else {
        let minutes = duration.num_minutes();
        if minutes >= 1 {
            format!("{}m", minutes)
        } else {
            "now".to_string()
        }
    }
}
