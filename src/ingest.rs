//! Turns exported quote dumps into rows ready for the store.

use anyhow::Context;

use crate::quote::NewQuote;

const TEXT_KEYS: &[&str] = &["text", "quote", "body", "quoteText"];
const AUTHOR_KEYS: &[&str] = &["author", "by", "source"];
const BOOK_KEYS: &[&str] = &["bookName"];
const CONTAINER_KEYS: &[&str] = &["quotes", "data", "items"];

static QUOTE_MARKS: std::sync::LazyLock<regex::Regex> =
    std::sync::LazyLock::new(|| regex::Regex::new(r#"“|”|''|""#).expect("valid regex"));
static DASHES: std::sync::LazyLock<regex::Regex> =
    std::sync::LazyLock::new(|| regex::Regex::new(r"–|—|―|~").expect("valid regex"));
// Greedy, so the split happens at the last spaced dash.
static ATTRIBUTION: std::sync::LazyLock<regex::Regex> =
    std::sync::LazyLock::new(|| regex::Regex::new(r"^(.*)\s-\s*(.*)$").expect("valid regex"));

pub(crate) fn parse_quotes_json(json: &str) -> anyhow::Result<Vec<NewQuote>> {
    let value: serde_json::Value =
        serde_json::from_str(json).context("Failed to parse quotes json")?;

    let entries = match value {
        serde_json::Value::Array(entries) => entries,
        serde_json::Value::Object(mut object) => {
            match CONTAINER_KEYS
                .iter()
                .find(|key| object.get(**key).is_some_and(|v| v.is_array()))
            {
                Some(key) => match object.remove(*key) {
                    Some(serde_json::Value::Array(entries)) => entries,
                    _ => Vec::new(),
                },
                None => vec![serde_json::Value::Object(object)],
            }
        }
        _ => Vec::new(),
    };

    let total = entries.len();
    let quotes: Vec<NewQuote> = entries.iter().filter_map(entry_to_quote).collect();

    tracing::info!(
        num_entries = total,
        num_quotes = quotes.len(),
        num_skipped = total - quotes.len(),
        "Parsed quotes json"
    );

    Ok(quotes)
}

fn entry_to_quote(entry: &serde_json::Value) -> Option<NewQuote> {
    match entry {
        serde_json::Value::String(text) => non_blank(text).map(|text| NewQuote {
            text,
            author: None,
        }),
        serde_json::Value::Object(object) => {
            let first_of = |keys: &[&str]| {
                keys.iter()
                    .filter_map(|key| object.get(*key).and_then(|v| v.as_str()))
                    .find_map(non_blank)
            };

            let text = first_of(TEXT_KEYS)?;
            let author = first_of(AUTHOR_KEYS);
            let book = first_of(BOOK_KEYS);

            let author = match (author, book) {
                (Some(author), Some(book)) => Some(format!("{author} - {book}")),
                (author, book) => author.or(book),
            };

            Some(NewQuote { text, author })
        }
        _ => None,
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Cleans one free-form line such as `“Stay hungry.” — steve jobs` and splits
/// off the attribution, which gets title-cased.
pub(crate) fn parse_raw_quote(raw: &str) -> Option<NewQuote> {
    let cleaned = QUOTE_MARKS.replace_all(raw, "");
    let cleaned = cleaned.replace('’', "'");
    let cleaned = DASHES.replace_all(&cleaned, "-");

    let (text, author) = match ATTRIBUTION.captures(&cleaned) {
        Some(captures) => (
            captures[1].trim().to_string(),
            non_blank(&captures[2]).map(|a| title_case(&a)),
        ),
        None => (cleaned.trim().to_string(), None),
    };

    if text.is_empty() {
        return None;
    }

    Some(NewQuote { text, author })
}

pub(crate) fn parse_raw_lines(raw: &str) -> Vec<NewQuote> {
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(parse_raw_quote)
        .collect()
}

/// Upper-cases the first letter of every run of letters, lower-cases the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_is_letter = false;

    for c in text.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(c);
            previous_is_letter = false;
        }
    }

    out
}
