use std::collections::BTreeSet;

use crate::duplicates::DuplicateGroup;
use crate::quote::Quote;
use crate::similarity::SimilarityGroup;

/// What the cleanup needs from storage.
pub(crate) trait QuoteStore {
    fn all_quotes(&self) -> anyhow::Result<Vec<Quote>>;

    /// `Ok(false)` when the id was already gone.
    fn delete_quote(&self, id: i64) -> anyhow::Result<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum CleanupMode {
    #[default]
    DryRun,
    Delete,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub(crate) struct DeletionPlan {
    pub(crate) exact_groups: Vec<DuplicateGroup>,
    pub(crate) similarity_groups: Vec<SimilarityGroup>,
    /// Ids marked by the exact pass.
    pub(crate) exact_ids: BTreeSet<i64>,
    /// Ids marked by the similarity pass that the exact pass had not marked.
    pub(crate) additional_similar_ids: BTreeSet<i64>,
    pub(crate) ids: BTreeSet<i64>,
}

impl DeletionPlan {
    pub(crate) fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct DeletionOutcome {
    pub(crate) attempted: usize,
    pub(crate) deleted: usize,
    pub(crate) failed: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct CleanupRun {
    pub(crate) plan: DeletionPlan,
    /// `None` for a dry run.
    pub(crate) outcome: Option<DeletionOutcome>,
}

/// Both passes run over the same input. The exact pass keeps the first member
/// of each group; the similarity pass keeps each group's main quote.
pub(crate) fn plan_deletions(quotes: &[Quote], threshold: f64) -> DeletionPlan {
    let exact_groups = crate::duplicates::find_exact_duplicates(quotes);
    let exact_ids: BTreeSet<i64> = exact_groups
        .iter()
        .flat_map(|group| group.quotes.iter().skip(1).map(|q| q.id))
        .collect();

    tracing::info!(
        num_groups = exact_groups.len(),
        num_marked = exact_ids.len(),
        "Marked exact duplicates"
    );

    let similarity_groups = crate::similarity::find_similar_quotes(quotes, threshold);
    let additional_similar_ids: BTreeSet<i64> = similarity_groups
        .iter()
        .flat_map(|group| group.similar.iter().map(|s| s.quote.id))
        .filter(|id| !exact_ids.contains(id))
        .collect();

    tracing::info!(
        num_groups = similarity_groups.len(),
        num_marked = additional_similar_ids.len(),
        threshold,
        "Marked similar quotes"
    );

    let ids = exact_ids.union(&additional_similar_ids).copied().collect();

    DeletionPlan {
        exact_groups,
        similarity_groups,
        exact_ids,
        additional_similar_ids,
        ids,
    }
}

/// Deletes row by row. A failing row is logged and counted, the rest of the
/// batch still runs.
pub(crate) fn apply(store: &impl QuoteStore, plan: &DeletionPlan) -> DeletionOutcome {
    let mut outcome = DeletionOutcome {
        attempted: plan.ids.len(),
        ..Default::default()
    };

    for &id in &plan.ids {
        match store.delete_quote(id) {
            Ok(true) => outcome.deleted += 1,
            Ok(false) => tracing::warn!(id, "Quote already gone"),
            Err(e) => {
                outcome.failed += 1;
                tracing::error!(id, error =? e, "Error deleting quote");
            }
        }
    }

    tracing::info!(
        attempted = outcome.attempted,
        deleted = outcome.deleted,
        failed = outcome.failed,
        "Finished deleting quotes"
    );

    outcome
}

pub(crate) fn run_cleanup(
    store: &impl QuoteStore,
    threshold: f64,
    mode: CleanupMode,
) -> anyhow::Result<CleanupRun> {
    let quotes = store.all_quotes()?;
    tracing::info!(num_quotes = quotes.len(), mode =? mode, "Loaded quotes for cleanup");

    let plan = plan_deletions(&quotes, threshold);

    let outcome = match mode {
        CleanupMode::Delete if !plan.is_empty() => Some(apply(store, &plan)),
        CleanupMode::Delete => Some(DeletionOutcome::default()),
        CleanupMode::DryRun => None,
    };

    Ok(CleanupRun { plan, outcome })
}
