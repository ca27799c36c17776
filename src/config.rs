use anyhow::Context;

#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub(crate) db_path: std::path::PathBuf,
    pub(crate) similarity_threshold: f64,
    pub(crate) default_lang: String,

    pub(crate) report_group_limit: usize,
    pub(crate) report_author_limit: usize,

    pub(crate) log_to_console: bool,
}

impl Config {
    /// Reads `.env` when present, then the process environment.
    pub(crate) fn load() -> anyhow::Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(e).context("Failed to load .env file");
            }
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let similarity_threshold = parse_or(
            &lookup,
            "SIMILARITY_THRESHOLD",
            crate::similarity::DEFAULT_THRESHOLD,
        )?;

        Ok(Self {
            db_path: lookup("QUOTES_DB_PATH")
                .unwrap_or_else(|| "./database.db".to_string())
                .into(),
            similarity_threshold: crate::similarity::validate_threshold(similarity_threshold)?,
            default_lang: lookup("DEFAULT_LANG").unwrap_or_else(|| "en".to_string()),
            report_group_limit: parse_or(&lookup, "REPORT_GROUP_LIMIT", 5)?,
            report_author_limit: parse_or(&lookup, "REPORT_AUTHOR_LIMIT", 20)?,
            log_to_console: parse_or(&lookup, "LOG_TO_CONSOLE", false)?,
        })
    }
}

fn parse_or<T>(lookup: impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{key} has invalid value {value:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.db_path, std::path::PathBuf::from("./database.db"));
        assert_eq!(config.similarity_threshold, 0.85);
        assert_eq!(config.default_lang, "en");
        assert_eq!(config.report_group_limit, 5);
        assert_eq!(config.report_author_limit, 20);
        assert!(!config.log_to_console);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("QUOTES_DB_PATH", "/tmp/quotes.db"),
            ("SIMILARITY_THRESHOLD", " 0.9 "),
            ("DEFAULT_LANG", "tr"),
            ("REPORT_AUTHOR_LIMIT", "3"),
            ("LOG_TO_CONSOLE", "true"),
        ]))
        .unwrap();

        assert_eq!(config.db_path, std::path::PathBuf::from("/tmp/quotes.db"));
        assert_eq!(config.similarity_threshold, 0.9);
        assert_eq!(config.default_lang, "tr");
        assert_eq!(config.report_author_limit, 3);
        assert!(config.log_to_console);
    }

    #[test]
    fn test_invalid_values() {
        assert!(Config::from_lookup(lookup(&[("SIMILARITY_THRESHOLD", "high")])).is_err());
        assert!(Config::from_lookup(lookup(&[("SIMILARITY_THRESHOLD", "0")])).is_err());
        assert!(Config::from_lookup(lookup(&[("SIMILARITY_THRESHOLD", "1.01")])).is_err());
        assert!(Config::from_lookup(lookup(&[("REPORT_GROUP_LIMIT", "-1")])).is_err());
        assert!(Config::from_lookup(lookup(&[("LOG_TO_CONSOLE", "yes")])).is_err());
    }
}
