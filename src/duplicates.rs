use std::collections::HashMap;

use crate::quote::Quote;

#[derive(Debug, Clone, serde::Serialize)]
pub(crate) struct DuplicateGroup {
    pub(crate) key: String,
    pub(crate) quotes: Vec<Quote>,
}

/// Groups quotes sharing a canonical key. Groups come back in the order their
/// key was first seen, members in input order, and singletons are dropped.
pub(crate) fn find_exact_duplicates(quotes: &[Quote]) -> Vec<DuplicateGroup> {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(quotes.len());
    let mut groups: Vec<DuplicateGroup> = Vec::new();

    for quote in quotes {
        let key = quote.canonical_key();
        match index.get(&key) {
            Some(&position) => groups[position].quotes.push(quote.clone()),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(DuplicateGroup {
                    key,
                    quotes: vec![quote.clone()],
                });
            }
        }
    }

    groups.retain(|group| group.quotes.len() > 1);

    tracing::debug!(
        num_quotes = quotes.len(),
        num_groups = groups.len(),
        "Scanned for exact duplicates"
    );

    groups
}
