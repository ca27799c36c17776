use anyhow::Context;

use crate::quote::{NewQuote, Quote};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoredQuote {
    pub(crate) id: i64,
    pub(crate) text: String,
    pub(crate) author: Option<String>,
    pub(crate) lang: Option<String>,
    pub(crate) view_count: i64,
}

const CREATE_QUOTES_TABLE: &str = "CREATE TABLE IF NOT EXISTS quotes (
    id INTEGER PRIMARY KEY,
    text TEXT NOT NULL,
    author TEXT,
    lang TEXT,
    viewCount INTEGER DEFAULT 0
)";

pub(crate) fn open_db(path: &std::path::Path) -> anyhow::Result<rusqlite::Connection> {
    let db = rusqlite::Connection::open(path)
        .with_context(|| format!("Failed to open db at {}", path.display()))?;
    create_schema(&db)?;
    Ok(db)
}

#[cfg(test)]
pub(crate) fn open_in_memory() -> anyhow::Result<rusqlite::Connection> {
    let db = rusqlite::Connection::open_in_memory()?;
    create_schema(&db)?;
    Ok(db)
}

fn create_schema(db: &rusqlite::Connection) -> anyhow::Result<()> {
    db.execute(CREATE_QUOTES_TABLE, ())
        .context("Failed to create quotes table")?;
    Ok(())
}

/// Every quote with non-blank text, in rowid order. Blank means empty after
/// trimming ASCII whitespace, the same test `count_quotes` and
/// `get_random_quote` apply.
pub(crate) fn get_all_quotes(db: &rusqlite::Connection) -> anyhow::Result<Vec<Quote>> {
    let mut stmt = db.prepare(
        "SELECT id, text, author FROM quotes
         WHERE TRIM(text, char(32, 9, 10, 11, 12, 13)) <> ''
         ORDER BY id",
    )?;

    let quotes = stmt
        .query_map([], |row| {
            Ok(Quote {
                id: row.get(0)?,
                text: row.get(1)?,
                author: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to read quotes")?;

    Ok(quotes)
}

pub(crate) fn count_quotes(db: &rusqlite::Connection) -> anyhow::Result<usize> {
    let count: i64 = db.query_row(
        "SELECT COUNT(*) FROM quotes WHERE TRIM(text, char(32, 9, 10, 11, 12, 13)) <> ''",
        [],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

/// Returns whether a row was removed. Deleting a missing id is a no-op.
pub(crate) fn delete_quote(db: &rusqlite::Connection, id: i64) -> anyhow::Result<bool> {
    let removed = db.execute("DELETE FROM quotes WHERE id = ?1", (id,))?;
    Ok(removed > 0)
}

/// Inserts all quotes with non-blank text in one transaction and returns how
/// many rows were written.
pub(crate) fn insert_quotes(
    db: &mut rusqlite::Connection,
    quotes: &[NewQuote],
    lang: &str,
) -> anyhow::Result<usize> {
    let tx = db.transaction()?;
    let mut inserted = 0;
    {
        let mut stmt = tx.prepare("INSERT INTO quotes (text, author, lang) VALUES (?1, ?2, ?3)")?;
        for quote in quotes.iter().filter(|q| !q.text.trim().is_empty()) {
            inserted += stmt
                .execute((&quote.text, &quote.author, lang))
                .context("Failed to insert quote")?;
        }
    }
    tx.commit()?;

    Ok(inserted)
}

/// Picks one of the least-viewed quotes at random and counts the view.
pub(crate) fn get_random_quote(
    db: &mut rusqlite::Connection,
) -> anyhow::Result<Option<StoredQuote>> {
    use rusqlite::OptionalExtension;

    let tx = db.transaction()?;
    let picked = tx
        .query_row(
            "SELECT id, text, author, lang, COALESCE(viewCount, 0)
             FROM quotes
             WHERE TRIM(text, char(32, 9, 10, 11, 12, 13)) <> ''
             ORDER BY COALESCE(viewCount, 0) ASC, RANDOM()
             LIMIT 1",
            [],
            |row| {
                Ok(StoredQuote {
                    id: row.get(0)?,
                    text: row.get(1)?,
                    author: row.get(2)?,
                    lang: row.get(3)?,
                    view_count: row.get(4)?,
                })
            },
        )
        .optional()?;

    let Some(mut quote) = picked else {
        return Ok(None);
    };

    tx.execute(
        "UPDATE quotes SET viewCount = COALESCE(viewCount, 0) + 1 WHERE id = ?1",
        (quote.id,),
    )?;
    tx.commit()?;

    quote.view_count += 1;
    Ok(Some(quote))
}

impl crate::cleanup::QuoteStore for rusqlite::Connection {
    fn all_quotes(&self) -> anyhow::Result<Vec<Quote>> {
        get_all_quotes(self)
    }

    fn delete_quote(&self, id: i64) -> anyhow::Result<bool> {
        delete_quote(self, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_quote(text: &str, author: Option<&str>) -> NewQuote {
        NewQuote {
            text: text.to_string(),
            author: author.map(str::to_string),
        }
    }

    #[test]
    fn test_insert_and_read_back() {
        let mut db = open_in_memory().unwrap();

        let inserted = insert_quotes(
            &mut db,
            &[
                new_quote("Be yourself.", Some("Wilde")),
                new_quote("   ", Some("Nobody")),
                new_quote("Carpe diem.", None),
            ],
            "en",
        )
        .unwrap();

        assert_eq!(inserted, 2);
        let quotes = get_all_quotes(&db).unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].text, "Be yourself.");
        assert_eq!(quotes[0].author.as_deref(), Some("Wilde"));
        assert_eq!(quotes[1].author, None);
        assert!(quotes[0].id < quotes[1].id);
    }

    #[test]
    fn test_blank_rows_are_skipped_on_read() {
        let db = open_in_memory().unwrap();
        db.execute("INSERT INTO quotes (text, author) VALUES ('', 'A')", ())
            .unwrap();
        db.execute("INSERT INTO quotes (text, author) VALUES ('Real', 'B')", ())
            .unwrap();

        let quotes = get_all_quotes(&db).unwrap();

        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].text, "Real");
    }

    #[test]
    fn test_count_matches_quotes_read() {
        let mut db = open_in_memory().unwrap();
        db.execute(
            "INSERT INTO quotes (text) VALUES (''), ('   '), (char(9, 10))",
            (),
        )
        .unwrap();
        insert_quotes(&mut db, &[new_quote("Kept.", None), new_quote("Also kept.", None)], "en")
            .unwrap();

        assert_eq!(count_quotes(&db).unwrap(), 2);
        assert_eq!(count_quotes(&db).unwrap(), get_all_quotes(&db).unwrap().len());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut db = open_in_memory().unwrap();
        insert_quotes(&mut db, &[new_quote("Only one.", None)], "en").unwrap();
        let id = get_all_quotes(&db).unwrap()[0].id;

        assert!(delete_quote(&db, id).unwrap());
        assert!(!delete_quote(&db, id).unwrap());
        assert_eq!(count_quotes(&db).unwrap(), 0);
    }

    #[test]
    fn test_random_quote_prefers_least_viewed() {
        let mut db = open_in_memory().unwrap();
        insert_quotes(
            &mut db,
            &[
                new_quote("One", None),
                new_quote("Two", None),
                new_quote("Three", None),
            ],
            "tr",
        )
        .unwrap();

        let mut seen: Vec<i64> = (0..3)
            .map(|_| get_random_quote(&mut db).unwrap().unwrap())
            .inspect(|q| {
                assert_eq!(q.view_count, 1);
                assert_eq!(q.lang.as_deref(), Some("tr"));
            })
            .map(|q| q.id)
            .collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 3);

        let fourth = get_random_quote(&mut db).unwrap().unwrap();
        assert_eq!(fourth.view_count, 2);
    }

    #[test]
    fn test_random_quote_treats_null_views_as_zero() {
        let mut db = open_in_memory().unwrap();
        db.execute(
            "INSERT INTO quotes (text, viewCount) VALUES ('Seen', 5), ('Fresh', NULL)",
            (),
        )
        .unwrap();

        let quote = get_random_quote(&mut db).unwrap().unwrap();

        assert_eq!(quote.text, "Fresh");
        assert_eq!(quote.view_count, 1);
    }

    #[test]
    fn test_random_quote_skips_blank_text() {
        let mut db = open_in_memory().unwrap();
        db.execute(
            "INSERT INTO quotes (text, viewCount) VALUES ('  ', 0), ('Served', 9)",
            (),
        )
        .unwrap();

        for _ in 0..3 {
            let quote = get_random_quote(&mut db).unwrap().unwrap();
            assert_eq!(quote.text, "Served");
        }

        db.execute("DELETE FROM quotes WHERE text = 'Served'", ()).unwrap();
        assert_eq!(get_random_quote(&mut db).unwrap(), None);
    }

    #[test]
    fn test_random_quote_on_empty_store() {
        let mut db = open_in_memory().unwrap();
        assert_eq!(get_random_quote(&mut db).unwrap(), None);
    }
}
