//! Markdown summary generation
//!
//! This module generates a human-readable markdown summary of the catalog:
//! crawl progress followed by one table per slot.

use crate::catalog::{CatalogEntry, Element, SlotHint};
use crate::output::stats::CatalogStatistics;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a markdown catalog summary
///
/// # Arguments
///
/// * `catalog` - Catalog entries in stored order
/// * `stats` - Statistics for the header section
/// * `output_path` - Path where the markdown file should be written
pub fn generate_markdown_summary(
    catalog: &[CatalogEntry],
    stats: &CatalogStatistics,
    output_path: &Path,
) -> std::io::Result<()> {
    let markdown = format_markdown_summary(catalog, stats);

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats the catalog as markdown
pub fn format_markdown_summary(catalog: &[CatalogEntry], stats: &CatalogStatistics) -> String {
    let mut md = String::new();

    md.push_str("# Equipment Catalog Summary\n\n");

    md.push_str("## Crawl Progress\n\n");
    md.push_str(&format!("- **Phase**: {}\n", stats.phase()));
    md.push_str(&format!("- **Titles**: {}\n", stats.total_titles));
    md.push_str(&format!("- **Progress**: {:.1}%\n", stats.progress()));
    md.push_str(&format!("- **Catalog Items**: {}\n", stats.total_items));
    if let Some(state) = &stats.state {
        md.push_str(&format!("- **Next Index**: {}\n", state.cursor));
        if let Some(at) = state.last_run {
            md.push_str(&format!("- **Last Run**: {}\n", at.to_rfc3339()));
        }
        if !state.failed_titles.is_empty() {
            md.push_str(&format!(
                "- **Failed Titles**: {}\n",
                state.failed_titles.len()
            ));
        }
    }
    md.push('\n');

    let mut by_slot: BTreeMap<SlotHint, Vec<&CatalogEntry>> = BTreeMap::new();
    for entry in catalog {
        by_slot.entry(entry.slot).or_default().push(entry);
    }

    for (slot, mut entries) in by_slot {
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        md.push_str(&format!("## {} ({})\n\n", capitalize(slot.as_str()), entries.len()));
        md.push_str("| Item | Level | Vocations | Resistances | Imbuement Slots |\n");
        md.push_str("|------|-------|-----------|-------------|-----------------|\n");

        for entry in entries {
            let level = entry
                .level
                .map(|level| level.to_string())
                .unwrap_or_else(|| "-".to_string());
            let vocations = entry
                .vocations
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(", ");

            md.push_str(&format!(
                "| [{}]({}) | {} | {} | {} | {} |\n",
                escape_cell(&entry.name),
                entry.source,
                level,
                vocations,
                format_resistances(&entry.resistances),
                entry.imbuement_slot_count
            ));
        }
        md.push('\n');
    }

    md
}

/// `fire +5%, ice -2%` in element order
fn format_resistances(resistances: &BTreeMap<Element, i32>) -> String {
    resistances
        .iter()
        .map(|(element, value)| format!("{} {:+}%", element, value))
        .collect::<Vec<_>>()
        .join(", ")
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
