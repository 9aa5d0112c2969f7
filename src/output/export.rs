use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use csv::{QuoteStyle, WriterBuilder};
use std::io::Write;
use std::path::Path;

use super::formatter::format_intensity;
use crate::supplier::ScoredSupplier;

/// File name used when no output path is given.
pub const DEFAULT_EXPORT_FILE: &str = "supplier_sustainability_rankings.csv";

const HEADERS: [&str; 13] = [
    "Rank",
    "Supplier Name",
    "Country",
    "Sector",
    "Sustainability Score",
    "ESG Total",
    "Scope 1 Intensity",
    "Scope 2 Intensity",
    "Scope 3 Intensity",
    "ISO 14001",
    "B-Corp",
    "Fair Trade",
    "Decarbonization Target",
];

fn yes_no(flag: bool) -> String {
    let text = if flag { "Yes" } else { "No" };
    text.to_string()
}

/// One export row. Absent text and an absent ESG total are empty cells.
fn export_row(scored: &ScoredSupplier) -> [String; 13] {
    let s = &scored.supplier;
    [
        scored.rank.to_string(),
        s.name.clone(),
        s.country.clone().unwrap_or_default(),
        s.sector.clone().unwrap_or_default(),
        format!("{:.1}", scored.score),
        s.esg_total.map(|v| v.to_string()).unwrap_or_default(),
        format_intensity(scored.s1_intensity),
        format_intensity(scored.s2_intensity),
        format_intensity(scored.s3_intensity),
        yes_no(s.is_iso14001),
        yes_no(s.is_bcorp),
        yes_no(s.is_fairtrade),
        yes_no(s.has_decarb_target),
    ]
}

/// Write suppliers as CSV with a header row and every cell quoted.
pub fn write_csv<W: Write>(suppliers: &[&ScoredSupplier], writer: W) -> Result<()> {
    let mut csv = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(writer);

    csv.write_record(HEADERS).context("Failed to write CSV header")?;
    for scored in suppliers {
        csv.write_record(export_row(scored))
            .with_context(|| format!("Failed to write row for {}", scored.supplier.supplier_id))?;
    }
    csv.flush().context("Failed to flush CSV output")?;
    Ok(())
}

/// Export suppliers to a CSV file, replacing it atomically.
pub fn export_csv(suppliers: &[&ScoredSupplier], path: &Path) -> Result<()> {
    let mut file = AtomicWriteFile::options()
        .open(path)
        .with_context(|| format!("Failed to open {} for writing", path.display()))?;
    write_csv(suppliers, &mut file)?;
    file.commit()
        .with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!(path = %path.display(), rows = suppliers.len(), "exported rankings");
    Ok(())
}
