//! Per-title rollups of a summary.
//!
//! Word counts only include `section` and `part` entries. Entries are grouped
//! by the part of the title number before an em dash, so `"7—Agriculture"`
//! and `"7"` land in the same row.

use std::collections::HashMap;

use serde::Serialize;

use ecfr_shared::SummaryEntry;

/// Totals for one title number.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TitleStats {
    /// Grouping key: the title number up to any em dash, trimmed.
    pub title_number: String,
    /// Full title-number token as first seen, for display.
    pub title_name: String,
    /// Sum of `word_count` over section and part entries.
    pub word_count: usize,
    pub section_count: usize,
    pub part_count: usize,
    /// All entries carrying this title number.
    pub entry_count: usize,
    /// `word_count` divided by `section_count`, or by 1 for titles without sections.
    pub avg_words_per_section: f64,
}

/// Rollup of a whole summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsReport {
    /// One row per title number, in first-seen order.
    pub titles: Vec<TitleStats>,
    /// Entries whose title number is absent.
    pub untitled_entries: usize,
}

impl StatsReport {
    pub fn total_words(&self) -> usize {
        self.titles.iter().map(|t| t.word_count).sum()
    }
}

/// Grouping key for a raw title number.
pub fn title_key(number: &str) -> &str {
    number.split('—').next().unwrap_or(number).trim()
}

/// Group `entries` by title number.
pub fn title_stats(entries: &[SummaryEntry]) -> StatsReport {
    let mut report = StatsReport::default();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for entry in entries {
        let Some(number) = entry.title_number.as_deref() else {
            report.untitled_entries += 1;
            continue;
        };

        let key = title_key(number);
        let slot = *index.entry(key).or_insert_with(|| {
            report.titles.push(TitleStats {
                title_number: key.to_string(),
                title_name: number.trim().to_string(),
                ..TitleStats::default()
            });
            report.titles.len() - 1
        });
        let stats = &mut report.titles[slot];

        stats.entry_count += 1;
        match entry.node_type.as_deref() {
            Some("section") => {
                stats.section_count += 1;
                stats.word_count += entry.word_count;
            }
            Some("part") => {
                stats.part_count += 1;
                stats.word_count += entry.word_count;
            }
            _ => {}
        }
    }

    for stats in &mut report.titles {
        stats.avg_words_per_section = stats.word_count as f64 / stats.section_count.max(1) as f64;
    }

    report
}
