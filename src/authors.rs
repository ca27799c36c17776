use std::collections::HashMap;

use crate::quote::Quote;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub(crate) struct AuthorCount {
    pub(crate) author: Option<String>,
    pub(crate) count: usize,
}

/// Quote count per raw author value, most prolific first. Authors are not
/// normalized here, so "Seneca" and "seneca" are counted apart.
pub(crate) fn count_by_author(quotes: &[Quote]) -> Vec<AuthorCount> {
    let mut index: HashMap<Option<&str>, usize> = HashMap::new();
    let mut counts: Vec<AuthorCount> = Vec::new();

    for quote in quotes {
        let author = quote.author.as_deref();
        match index.get(&author) {
            Some(&position) => counts[position].count += 1,
            None => {
                index.insert(author, counts.len());
                counts.push(AuthorCount {
                    author: author.map(str::to_string),
                    count: 1,
                });
            }
        }
    }

    // Stable, so ties stay in first-seen order.
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_by_author() {
        let quotes = vec![
            Quote::new(1, "x", Some("A")),
            Quote::new(2, "y", None),
            Quote::new(3, "z", Some("A")),
        ];

        let counts = count_by_author(&quotes);

        assert_eq!(
            counts,
            vec![
                AuthorCount {
                    author: Some("A".to_string()),
                    count: 2
                },
                AuthorCount {
                    author: None,
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn test_authors_are_not_normalized() {
        let quotes = vec![
            Quote::new(1, "x", Some("Seneca")),
            Quote::new(2, "y", Some("seneca")),
            Quote::new(3, "z", Some("")),
            Quote::new(4, "w", None),
        ];

        let counts = count_by_author(&quotes);

        assert_eq!(counts.len(), 4);
        assert!(counts.iter().all(|c| c.count == 1));
        let authors: Vec<Option<&str>> = counts.iter().map(|c| c.author.as_deref()).collect();
        assert_eq!(authors, vec![Some("Seneca"), Some("seneca"), Some(""), None]);
    }

    #[test]
    fn test_sorted_descending() {
        let quotes = vec![
            Quote::new(1, "a", Some("Rumi")),
            Quote::new(2, "b", Some("Yunus Emre")),
            Quote::new(3, "c", Some("Yunus Emre")),
            Quote::new(4, "d", Some("Mevlana")),
            Quote::new(5, "e", Some("Yunus Emre")),
            Quote::new(6, "f", Some("Mevlana")),
        ];

        let counts: Vec<(String, usize)> = count_by_author(&quotes)
            .into_iter()
            .map(|c| (c.author.unwrap_or_default(), c.count))
            .collect();

        assert_eq!(
            counts,
            vec![
                ("Yunus Emre".to_string(), 3),
                ("Mevlana".to_string(), 2),
                ("Rumi".to_string(), 1),
            ]
        );
    }
}
