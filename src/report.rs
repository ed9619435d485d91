//! Plain-text tables for the CLI and the interactive session.
//!
//! Every printer writes to any [`Write`] so the session can be driven and
//! checked in tests without a terminal.

use qualcode_core::TaggingEngine;
use std::io::{self, Write};

use crate::analysis::{CorpusSummary, SentimentDistribution, TermCount, Theme};

/// Column width for document text in the document table.
const TEXT_WIDTH: usize = 60;

pub fn print_summary(out: &mut impl Write, s: &CorpusSummary) -> io::Result<()> {
    writeln!(out, "Corpus summary")?;
    writeln!(out, "==============")?;
    writeln!(out)?;
    writeln!(out, "  Documents:       {}", s.documents)?;
    writeln!(out, "  Total words:     {}", s.total_words)?;
    writeln!(out, "  Unique terms:    {}", s.unique_terms)?;
    writeln!(
        out,
        "  Words per doc:   {:.1} avg, {} min, {} max",
        s.avg_words_per_document, s.min_words, s.max_words
    )?;
    writeln!(out)
}

pub fn print_frequencies(out: &mut impl Write, terms: &[TermCount]) -> io::Result<()> {
    if terms.is_empty() {
        return writeln!(out, "No terms found.");
    }
    let peak = terms[0].count.max(1);
    writeln!(out, "  {:<24} {:>6}", "TERM", "COUNT")?;
    writeln!(out, "  {}", "-".repeat(52))?;
    for t in terms {
        let bar = "#".repeat((t.count * 20).div_ceil(peak));
        writeln!(out, "  {:<24} {:>6}  {}", t.term, t.count, bar)?;
    }
    Ok(())
}

pub fn print_sentiment(out: &mut impl Write, d: &SentimentDistribution) -> io::Result<()> {
    let total = d.positive + d.neutral + d.negative;
    writeln!(out, "  {:<10} {:>6} {:>6}", "SENTIMENT", "DOCS", "SHARE")?;
    writeln!(out, "  {}", "-".repeat(24))?;
    for (name, n) in [
        ("positive", d.positive),
        ("neutral", d.neutral),
        ("negative", d.negative),
    ] {
        writeln!(out, "  {:<10} {:>6} {:>5}%", name, n, percent(n, total))?;
    }
    writeln!(out)?;
    writeln!(out, "  Mean polarity: {:+.2}", d.mean_polarity)
}

pub fn print_themes(out: &mut impl Write, themes: &[Theme]) -> io::Result<()> {
    if themes.is_empty() {
        return writeln!(out, "No themes found.");
    }
    for theme in themes {
        let ids: Vec<String> = theme.document_ids.iter().map(|i| i.to_string()).collect();
        writeln!(
            out,
            "  {} ({} mentions, {} docs): {}",
            theme.keyword,
            theme.occurrences,
            theme.document_ids.len(),
            ids.join(" ")
        )?;
    }
    Ok(())
}

/// The label vocabulary with per-label document counts.
pub fn print_codes(out: &mut impl Write, engine: &TaggingEngine) -> io::Result<()> {
    let counts = engine.label_counts();
    if counts.is_empty() {
        return writeln!(out, "No codes defined.");
    }
    writeln!(out, "  {:<24} {:>6}", "CODE", "DOCS")?;
    writeln!(out, "  {}", "-".repeat(31))?;
    for (label, n) in counts {
        writeln!(out, "  {:<24} {:>6}", label, n)?;
    }
    Ok(())
}

/// The assignment table, optionally limited to the first `limit` rows.
pub fn print_documents(
    out: &mut impl Write,
    engine: &TaggingEngine,
    limit: Option<usize>,
) -> io::Result<()> {
    let rows = engine.display_rows();
    if rows.is_empty() {
        return writeln!(out, "No documents loaded.");
    }
    writeln!(out, "  {:>5}  {:<width$}  LABELS", "ID", "TEXT", width = TEXT_WIDTH)?;
    writeln!(out, "  {}", "-".repeat(TEXT_WIDTH + 16))?;
    let shown = limit.unwrap_or(rows.len());
    for row in rows.iter().take(shown) {
        writeln!(
            out,
            "  {:>5}  {:<width$}  {}",
            row.document_id,
            truncate(&row.text, TEXT_WIDTH),
            row.labels,
            width = TEXT_WIDTH
        )?;
    }
    if shown < rows.len() {
        writeln!(out, "  ... {} more", rows.len() - shown)?;
    }
    Ok(())
}

fn percent(n: usize, total: usize) -> usize {
    if total == 0 {
        0
    } else {
        (n * 100) / total
    }
}

fn truncate(text: &str, width: usize) -> String {
    let single_line = text.replace(['\n', '\r'], " ");
    if single_line.chars().count() <= width {
        single_line
    } else {
        let mut s: String = single_line.chars().take(width.saturating_sub(3)).collect();
        s.push_str("...");
        s
    }
}
