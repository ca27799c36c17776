use std::fmt::Write;

use crate::authors::AuthorCount;
use crate::cleanup::{CleanupRun, DeletionOutcome, DeletionPlan};
use crate::db::StoredQuote;
use crate::duplicates::DuplicateGroup;
use crate::similarity::SimilarityGroup;

const RULE_WIDTH: usize = 80;
const PREVIEW_CHARS: usize = 80;

pub(crate) struct ReportLimits {
    pub(crate) groups: usize,
    pub(crate) authors: usize,
}

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{}\n{}\n{}", rule(), title, rule());
}

fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

fn author_label(author: Option<&str>) -> &str {
    author.unwrap_or("None")
}

pub(crate) fn analysis_report(
    total: usize,
    plan: &DeletionPlan,
    authors: &[AuthorCount],
    limits: &ReportLimits,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}\nQUOTE SIMILARITY ANALYSIS AND CLEANUP\n{}", rule(), rule());
    let _ = writeln!(out, "\nTotal quotes in database: {total}");

    heading(&mut out, "EXACT DUPLICATES (same text + author)");
    write_exact_groups(&mut out, &plan.exact_groups, limits.groups);

    heading(&mut out, "SIMILAR QUOTES");
    write_similarity_groups(&mut out, &plan.similarity_groups, limits.groups);

    heading(&mut out, &format!("QUOTES PER AUTHOR (Top {})", limits.authors));
    for (i, count) in authors.iter().take(limits.authors).enumerate() {
        let _ = writeln!(
            out,
            "{:2}. {:<50} - {:4} quotes",
            i + 1,
            author_label(count.author.as_deref()),
            count.count
        );
    }
    let _ = writeln!(out, "\nTotal unique authors: {}", authors.len());

    out
}

fn write_exact_groups(out: &mut String, groups: &[DuplicateGroup], limit: usize) {
    if groups.is_empty() {
        let _ = writeln!(out, "\nNo exact duplicates found.");
        return;
    }

    let _ = writeln!(out, "\nFound {} groups of exact duplicates:", groups.len());
    for (i, group) in groups.iter().take(limit).enumerate() {
        let _ = writeln!(out, "\nGroup {} ({} duplicates):", i + 1, group.quotes.len());
        for quote in &group.quotes {
            let _ = writeln!(out, "  ID {}: {}", quote.id, preview(&quote.text));
            let _ = writeln!(out, "             Author: {}", author_label(quote.author.as_deref()));
        }
    }
    if groups.len() > limit {
        let _ = writeln!(out, "\n... and {} more groups", groups.len() - limit);
    }
}

fn write_similarity_groups(out: &mut String, groups: &[SimilarityGroup], limit: usize) {
    if groups.is_empty() {
        let _ = writeln!(out, "\nNo similar quotes found.");
        return;
    }

    let _ = writeln!(out, "\nFound {} groups of similar quotes:", groups.len());
    for (i, group) in groups.iter().take(limit).enumerate() {
        let _ = writeln!(out, "\nGroup {}:", i + 1);
        let _ = writeln!(out, "  Main ID {}: {}", group.main.id, preview(&group.main.text));
        let _ = writeln!(out, "             Author: {}", author_label(group.main.author.as_deref()));
        let _ = writeln!(out, "\n  Similar to:");
        for similar in &group.similar {
            let _ = writeln!(
                out,
                "    ID {} ({:.1}% match): {}",
                similar.quote.id,
                similar.similarity * 100.0,
                preview(&similar.quote.text)
            );
            let _ = writeln!(
                out,
                "               Author: {}",
                author_label(similar.quote.author.as_deref())
            );
        }
    }
    if groups.len() > limit {
        let _ = writeln!(out, "\n... and {} more groups", groups.len() - limit);
    }
}

pub(crate) fn cleanup_summary(run: &CleanupRun) -> String {
    let plan = &run.plan;
    let mut out = String::new();

    heading(&mut out, "CLEANUP");
    let _ = writeln!(
        out,
        "Exact duplicates: {} groups, {} quotes marked",
        plan.exact_groups.len(),
        plan.exact_ids.len()
    );
    let _ = writeln!(
        out,
        "Similar quotes: {} groups, {} additional quotes marked",
        plan.similarity_groups.len(),
        plan.additional_similar_ids.len()
    );
    let _ = writeln!(out, "\nSUMMARY: {} quotes marked for deletion", plan.ids.len());

    if plan.is_empty() {
        let _ = writeln!(out, "\nNo quotes to delete. Database is clean!");
        return out;
    }

    match run.outcome {
        None => {
            let _ = writeln!(out, "\nDRY RUN - no quotes were deleted.");
        }
        Some(DeletionOutcome {
            attempted,
            deleted,
            failed,
        }) => {
            let _ = writeln!(out, "\nDeleted {deleted} of {attempted} quotes");
            if failed > 0 {
                let _ = writeln!(out, "{failed} deletions failed, see the log for details");
            }
        }
    }

    out
}

pub(crate) fn random_quote_line(quote: &StoredQuote) -> String {
    format!(
        "\"{}\" - {} (lang={}, id={}, views={})",
        quote.text,
        quote.author.as_deref().unwrap_or("Unknown"),
        quote.lang.as_deref().unwrap_or("?"),
        quote.id,
        quote.view_count
    )
}
