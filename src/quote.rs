#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub(crate) struct Quote {
    pub(crate) id: i64,
    pub(crate) text: String,
    pub(crate) author: Option<String>,
}

impl Quote {
    #[cfg(test)]
    pub(crate) fn new(id: i64, text: &str, author: Option<&str>) -> Self {
        Self {
            id,
            text: text.to_string(),
            author: author.map(str::to_string),
        }
    }

    /// Unit of comparison for both duplicate passes: `"<text> | <author>"`,
    /// each half lower-cased and trimmed. A missing author compares as empty.
    pub(crate) fn canonical_key(&self) -> String {
        format!(
            "{} | {}",
            normalize(&self.text),
            normalize(self.author.as_deref().unwrap_or(""))
        )
    }
}

/// A quote that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NewQuote {
    pub(crate) text: String,
    pub(crate) author: Option<String>,
}

pub(crate) fn normalize(text: &str) -> String {
    text.to_lowercase().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Be Yourself.  "), "be yourself.");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("\t\n"), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for input in ["  MiXeD Case ", "İstanbul", "already normal", " \u{2003}ÆSIR\u{2003}"] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_canonical_key() {
        let quote = Quote::new(1, "Be yourself.", Some("A"));
        assert_eq!(quote.canonical_key(), "be yourself. | a");

        let anonymous = Quote::new(2, " Carpe diem. ", None);
        assert_eq!(anonymous.canonical_key(), "carpe diem. | ");

        // Missing and empty authors are different values but compare the same.
        let empty = Quote::new(3, "Carpe diem.", Some(""));
        assert_eq!(anonymous.canonical_key(), empty.canonical_key());
        assert_ne!(anonymous.author, empty.author);
    }
}
